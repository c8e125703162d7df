//! Error types for the webhook notifier

use thiserror::Error;

/// Result type for notifier operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur delivering a notification
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport error
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Missing environment variable
    #[error("{0} environment variable is not set")]
    MissingEnv(&'static str),

    /// Webhook endpoint rejected the message
    #[error("received error response: {0}")]
    Status(String),
}
