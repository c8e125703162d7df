//! Unsigned-commit classifier
//!
//! Flags PRs containing commits without a verified signature and keeps a
//! single advisory comment in sync with that state. Runs over all PRs,
//! not just community ones - the signature policy applies to internal
//! contributors too.

use std::collections::HashSet;

use octocrab::models::CommentId;
use prwatch_core::Config;
use tracing::{debug, info, warn};

use crate::client::PER_PAGE;
use crate::types::PrCommit;
use crate::{
    find_prs, Classification, Finding, GitHubClient, Mode, PullRequestRef, RepoName, Result,
};

/// Login the advisory comment is posted under, used to recognize our own
/// comment on later sweeps
pub const ADVISORY_AUTHOR: &str = "prwatch-bot";

/// Exact advisory text; dedup compares against this verbatim
pub const ADVISORY_BODY: &str = "Your commits are not signed and our branch protection rules \
require signed commits. For more information on how to create signed commits, please visit \
https://docs.github.com/en/authentication/managing-commit-signature-verification/about-commit-signature-verification. \
Please close this pull request and open a new one with signed commits.";

/// Sweep all configured repositories for PRs with unsigned commits
pub async fn check_unsigned(client: &GitHubClient, cfg: &Config) -> Result<Vec<Finding>> {
    // Discovery filters are irrelevant in all-authors mode
    let no_filter = HashSet::new();
    let mut findings = Vec::new();

    for check in &cfg.check_repos {
        let repo: RepoName = match check.name.parse() {
            Ok(repo) => repo,
            Err(e) => {
                warn!(repo = %check.name, error = %e, "Skipping repository");
                continue;
            }
        };

        info!(repo = %repo, "Checking repository for unsigned commits");
        let prs = find_prs(
            client,
            &repo,
            &no_filter,
            &no_filter,
            check.minimum_number,
            Mode::All,
        )
        .await?;

        for pr in prs {
            match classify(client, &pr).await {
                Ok(Classification::UnsignedCommits) => {
                    info!(pr = %pr.html_url, author = %pr.author, "Pull request has unsigned commits");
                    if let Err(e) = ensure_advisory_comment(client, &pr).await {
                        warn!(pr = %pr.html_url, error = %e, "Could not post advisory comment");
                    }
                    findings.push(Finding::new(&pr));
                }
                Ok(_) => {
                    debug!(pr = %pr.html_url, "All commits are signed");
                    if let Err(e) = remove_advisory_comment(client, &pr).await {
                        warn!(pr = %pr.html_url, error = %e, "Could not remove advisory comment");
                    }
                }
                Err(e) => {
                    warn!(pr = %pr.html_url, error = %e, "Could not check commits, skipping");
                }
            }
        }
    }

    Ok(findings)
}

/// Classify a single PR: unsigned iff any commit lacks a verified signature
async fn classify(client: &GitHubClient, pr: &PullRequestRef) -> Result<Classification> {
    let commits: Vec<PrCommit> = client
        .get_all(&format!(
            "/repos/{}/{}/pulls/{}/commits",
            pr.repo.owner, pr.repo.name, pr.number
        ))
        .await?;

    if commits.iter().any(commit_is_unsigned) {
        Ok(Classification::UnsignedCommits)
    } else {
        Ok(Classification::Clean)
    }
}

/// Unsigned means verification metadata is absent or present but unverified
fn commit_is_unsigned(commit: &PrCommit) -> bool {
    match &commit.commit.verification {
        None => true,
        Some(v) => !v.verified,
    }
}

/// Post the advisory comment unless it is already there
///
/// Check-then-act: two overlapping sweeps can each miss the other's comment
/// and post twice. Accepted as a tolerable failure mode rather than locked.
async fn ensure_advisory_comment(client: &GitHubClient, pr: &PullRequestRef) -> Result<()> {
    if find_advisory_comment(client, pr).await?.is_some() {
        debug!(pr = %pr.html_url, "Advisory comment already present");
        return Ok(());
    }

    client
        .inner()
        .issues(&pr.repo.owner, &pr.repo.name)
        .create_comment(pr.number, ADVISORY_BODY)
        .await?;

    info!(pr = %pr.html_url, "Posted unsigned-commit advisory comment");
    Ok(())
}

/// Delete the advisory comment once every commit is signed
async fn remove_advisory_comment(client: &GitHubClient, pr: &PullRequestRef) -> Result<()> {
    let Some(comment_id) = find_advisory_comment(client, pr).await? else {
        return Ok(());
    };

    client
        .inner()
        .issues(&pr.repo.owner, &pr.repo.name)
        .delete_comment(comment_id)
        .await?;

    info!(pr = %pr.html_url, "Removed stale advisory comment");
    Ok(())
}

/// Find our advisory comment on the PR, matched by author and body
async fn find_advisory_comment(
    client: &GitHubClient,
    pr: &PullRequestRef,
) -> Result<Option<CommentId>> {
    let mut page = client
        .inner()
        .issues(&pr.repo.owner, &pr.repo.name)
        .list_comments(pr.number)
        .per_page(PER_PAGE as u8)
        .send()
        .await?;

    loop {
        for comment in &page.items {
            if matches_advisory(&comment.user.login, comment.body.as_deref()) {
                return Ok(Some(comment.id));
            }
        }
        match client.inner().get_page(&page.next).await? {
            Some(next) => page = next,
            None => return Ok(None),
        }
    }
}

/// Whether a comment is our advisory, compared case-insensitively
fn matches_advisory(author: &str, body: Option<&str>) -> bool {
    author == ADVISORY_AUTHOR
        && body.is_some_and(|b| b.eq_ignore_ascii_case(ADVISORY_BODY))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CommitDetail, CommitVerification};

    fn commit(verification: Option<CommitVerification>) -> PrCommit {
        PrCommit {
            commit: CommitDetail {
                author: None,
                verification,
            },
        }
    }

    #[test]
    fn test_missing_verification_is_unsigned() {
        assert!(commit_is_unsigned(&commit(None)));
    }

    #[test]
    fn test_unverified_signature_is_unsigned() {
        assert!(commit_is_unsigned(&commit(Some(CommitVerification {
            verified: false
        }))));
    }

    #[test]
    fn test_verified_signature_is_signed() {
        assert!(!commit_is_unsigned(&commit(Some(CommitVerification {
            verified: true
        }))));
    }

    #[test]
    fn test_matches_advisory_exact() {
        assert!(matches_advisory(ADVISORY_AUTHOR, Some(ADVISORY_BODY)));
    }

    #[test]
    fn test_matches_advisory_is_case_insensitive_on_body() {
        let upper = ADVISORY_BODY.to_uppercase();
        assert!(matches_advisory(ADVISORY_AUTHOR, Some(&upper)));
    }

    #[test]
    fn test_matches_advisory_rejects_other_authors_and_bodies() {
        assert!(!matches_advisory("someone-else", Some(ADVISORY_BODY)));
        assert!(!matches_advisory(ADVISORY_AUTHOR, Some("different text")));
        assert!(!matches_advisory(ADVISORY_AUTHOR, None));
    }
}
