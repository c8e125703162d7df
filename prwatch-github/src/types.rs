//! Domain types shared across the GitHub layer

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::Error;

/// A repository identifier in `owner/name` form
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoName {
    pub owner: String,
    pub name: String,
}

impl FromStr for RepoName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
                Ok(RepoName {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(Error::RepoFormat(s.to_string())),
        }
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Which PR authors discovery should return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Only PRs from outside the internal team and skip-user list
    Community,
    /// Every non-draft PR regardless of author
    All,
}

/// A pull request as seen during one sweep
///
/// Built fresh from the API on every sweep and never persisted.
#[derive(Debug, Clone)]
pub struct PullRequestRef {
    pub repo: RepoName,
    pub number: u64,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub draft: bool,
    pub labels: Vec<String>,
    pub head_sha: String,
    pub html_url: String,
}

impl PullRequestRef {
    /// Map an octocrab pull request into a sweep-local reference
    ///
    /// Returns `None` for PRs with no author login, which cannot be
    /// classified against team membership.
    pub(crate) fn from_octocrab(
        repo: &RepoName,
        pr: octocrab::models::pulls::PullRequest,
    ) -> Option<Self> {
        let author = match pr.user {
            Some(user) => user.login.clone(),
            None => {
                warn!(repo = %repo, number = pr.number, "Pull request has no author, skipping");
                return None;
            }
        };

        let html_url = pr
            .html_url
            .map(|u| u.to_string())
            .unwrap_or_else(|| format!("https://github.com/{}/pull/{}", repo, pr.number));

        Some(PullRequestRef {
            repo: repo.clone(),
            number: pr.number,
            author,
            created_at: pr.created_at.unwrap_or_else(Utc::now),
            draft: pr.draft.unwrap_or(false),
            labels: pr
                .labels
                .unwrap_or_default()
                .into_iter()
                .map(|l| l.name)
                .collect(),
            head_sha: pr.head.sha,
            html_url,
        })
    }
}

/// Outcome of running one classifier against one pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Blocked waiting for workflow approval, no maintainer has engaged
    /// since the commit that triggered the gate
    PendingCi { last_commit: DateTime<Utc> },
    /// No qualifying maintainer activity inside the stale window
    Stale,
    /// At least one commit lacks a verified signature
    UnsignedCommits,
    /// Nothing actionable
    Clean,
}

/// A classified pull request handed to the notification dispatcher
#[derive(Debug, Clone)]
pub struct Finding {
    /// Repository in `owner/name` form, the state-store key
    pub repo: String,
    pub number: u64,
    pub url: String,
}

impl Finding {
    pub fn new(pr: &PullRequestRef) -> Self {
        Finding {
            repo: pr.repo.to_string(),
            number: pr.number,
            url: pr.html_url.clone(),
        }
    }
}

/// Commit entry from the PR commits endpoint
///
/// Only the fields the classifiers read; octocrab's commit models do not
/// expose signature verification, so this is deserialized from the raw
/// route instead.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PrCommit {
    pub commit: CommitDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CommitDetail {
    pub author: Option<CommitIdentity>,
    pub verification: Option<CommitVerification>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CommitIdentity {
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CommitVerification {
    pub verified: bool,
}
