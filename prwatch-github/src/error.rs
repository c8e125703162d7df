//! Error types for GitHub operations

use thiserror::Error;

/// Result type for GitHub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during GitHub operations
#[derive(Error, Debug)]
pub enum Error {
    /// GitHub API error
    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),

    /// Authentication error
    #[error("GitHub authentication error: {0}")]
    Auth(String),

    /// Request exceeded the per-call time limit
    #[error("request to {0} timed out")]
    Timeout(String),

    /// Malformed team identifier
    #[error("invalid team name - must contain org and team: {0}")]
    TeamFormat(String),

    /// Malformed repository identifier
    #[error("invalid repository name - must contain owner and repository: {0}")]
    RepoFormat(String),
}
