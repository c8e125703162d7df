//! prwatch core - configuration and shared plumbing for the PR monitor
//!
//! This crate holds the configuration model (which repositories to watch,
//! which team counts as internal) and the secrets loader used by the
//! GitHub layer.

pub mod config;
pub mod error;
pub mod secrets;

pub use config::{CheckRepo, Config};
pub use error::{Error, Result};
pub use secrets::Secrets;
