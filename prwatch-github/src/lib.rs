//! prwatch GitHub layer
//!
//! Everything that talks to the GitHub API lives here: client construction,
//! team membership resolution, open-PR discovery, and the three per-PR
//! classifiers (pending CI approval, stale, unsigned commits).

mod client;
mod discover;
mod error;
mod pending_ci;
mod stale;
mod team;
mod types;
mod unsigned;

pub use client::GitHubClient;
pub use discover::find_prs;
pub use error::{Error, Result};
pub use pending_ci::check_pending_ci;
pub use stale::check_stale;
pub use team::team_members;
pub use types::{Classification, Finding, Mode, PullRequestRef, RepoName};
pub use unsigned::{check_unsigned, ADVISORY_AUTHOR, ADVISORY_BODY};
