//! GitHub API client using octocrab

use std::time::Duration;

use octocrab::Octocrab;
use prwatch_core::Secrets;
use serde::de::DeserializeOwned;
use tokio::time::timeout;
use tracing::debug;

use crate::{Error, Result};

/// Page size used for every paginated listing
pub(crate) const PER_PAGE: usize = 100;

/// Upper bound on any single outbound request. A hung request aborts only
/// the unit of work it belongs to, never the sweep.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// GitHub API client shared by discovery and the classifiers
pub struct GitHubClient {
    inner: Octocrab,
}

impl GitHubClient {
    /// Create a new client with the token from the environment or secrets file
    ///
    /// Token is loaded from (in priority order):
    /// 1. GITHUB_TOKEN environment variable
    /// 2. ~/.config/prwatch/secrets.toml
    pub fn new() -> Result<Self> {
        let secrets = Secrets::load().map_err(|e| Error::Auth(e.to_string()))?;

        let token = secrets.github_token().ok_or_else(|| {
            Error::Auth(
                "GitHub token not found. Set GITHUB_TOKEN environment variable \
                 or add token to ~/.config/prwatch/secrets.toml"
                    .to_string(),
            )
        })?;

        Self::from_token(token)
    }

    /// Create a client from an explicit token
    pub fn from_token(token: impl Into<String>) -> Result<Self> {
        let inner = Octocrab::builder()
            .personal_token(token.into())
            .build()
            .map_err(|e| Error::Auth(format!("Failed to create GitHub client: {}", e)))?;

        Ok(Self { inner })
    }

    /// Get the underlying octocrab client
    pub fn inner(&self) -> &Octocrab {
        &self.inner
    }

    /// Fetch one page of a raw API route
    ///
    /// Used for endpoints whose octocrab models miss fields the classifiers
    /// need (commit verification, issue timeline, team membership). Pages
    /// are 1-based; a page shorter than [`PER_PAGE`] is the last one.
    pub(crate) async fn get_page_of<T: DeserializeOwned>(
        &self,
        route: &str,
        page: usize,
    ) -> Result<Vec<T>> {
        let url = format!("{route}?per_page={PER_PAGE}&page={page}");
        debug!(route = %url, "Fetching raw API page");

        timeout(REQUEST_TIMEOUT, self.inner.get(&url, None::<&()>))
            .await
            .map_err(|_| Error::Timeout(route.to_string()))?
            .map_err(Error::Api)
    }

    /// Fetch every page of a raw API route
    pub(crate) async fn get_all<T: DeserializeOwned>(&self, route: &str) -> Result<Vec<T>> {
        let mut out = Vec::new();
        let mut page = 1;

        loop {
            let batch: Vec<T> = self.get_page_of(route, page).await?;
            let len = batch.len();
            out.extend(batch);

            if len < PER_PAGE {
                break;
            }
            page += 1;
        }

        Ok(out)
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient").finish_non_exhaustive()
    }
}
