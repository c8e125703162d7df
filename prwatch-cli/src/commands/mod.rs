//! CLI command implementations

pub mod notify;
pub mod suppress;

pub use notify::SweepSettings;
pub use suppress::SuppressArgs;
