//! Outbound webhook notifier
//!
//! Delivers alert messages to a fixed external channel. The endpoint and
//! bearer token come from the environment; a non-2xx response is an error
//! the caller handles with a fixed backoff sleep.

mod error;

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

pub use error::{Error, Result};

/// Environment variable naming the webhook endpoint
pub const WEBHOOK_URL_ENV: &str = "PRWATCH_WEBHOOK_URL";

/// Environment variable holding the bearer token
pub const WEBHOOK_TOKEN_ENV: &str = "PRWATCH_WEBHOOK_TOKEN";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The annotations in an alert
#[derive(Debug, Clone, Serialize)]
pub struct Annotation {
    pub title: String,
    pub description: String,
}

/// A single alert
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub status: String,
    pub annotations: Annotation,
}

/// The message envelope the webhook expects
#[derive(Debug, Clone, Serialize)]
pub struct WebhookMessage {
    pub alerts: Vec<Alert>,
}

impl WebhookMessage {
    /// Wrap one alert in the envelope
    pub fn new(status: &str, title: &str, description: &str) -> Self {
        WebhookMessage {
            alerts: vec![Alert {
                status: status.to_string(),
                annotations: Annotation {
                    title: title.to_string(),
                    description: description.to_string(),
                },
            }],
        }
    }
}

/// Webhook client bound to one endpoint
pub struct Notifier {
    client: reqwest::Client,
    webhook_url: String,
    auth_token: String,
}

impl Notifier {
    /// Build a notifier from `PRWATCH_WEBHOOK_URL` / `PRWATCH_WEBHOOK_TOKEN`
    pub fn from_env() -> Result<Self> {
        let webhook_url =
            std::env::var(WEBHOOK_URL_ENV).map_err(|_| Error::MissingEnv(WEBHOOK_URL_ENV))?;
        let auth_token =
            std::env::var(WEBHOOK_TOKEN_ENV).map_err(|_| Error::MissingEnv(WEBHOOK_TOKEN_ENV))?;

        Self::new(webhook_url, auth_token)
    }

    /// Build a notifier for an explicit endpoint
    pub fn new(webhook_url: impl Into<String>, auth_token: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Notifier {
            client,
            webhook_url: webhook_url.into(),
            auth_token: auth_token.into(),
        })
    }

    /// Deliver one alert to the channel
    pub async fn send(&self, status: &str, title: &str, description: &str) -> Result<()> {
        let message = WebhookMessage::new(status, title, description);
        debug!(title = title, "Sending webhook message");

        let response = self
            .client
            .post(&self.webhook_url)
            .bearer_auth(&self.auth_token)
            .json(&message)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Status(response.status().to_string()));
        }

        info!("Message successfully sent");
        Ok(())
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("webhook_url", &self.webhook_url)
            .finish_non_exhaustive()
    }
}
