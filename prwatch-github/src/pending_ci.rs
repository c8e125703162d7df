//! Pending-CI classifier
//!
//! Flags community PRs whose workflow runs are blocked on manual approval
//! while no maintainer has engaged since the last commit.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use octocrab::models::pulls::ReviewState;
use prwatch_core::Config;
use tracing::{debug, info, warn};

use crate::client::PER_PAGE;
use crate::types::PrCommit;
use crate::{
    find_prs, team_members, Classification, Finding, GitHubClient, Mode, PullRequestRef, RepoName,
    Result,
};

/// Hours after the last commit CI gets to start on its own before the
/// PR is considered actionable
const CI_GRACE_HOURS: i64 = 2;

/// Workflow run status meaning the run is gated on manual approval
const ACTION_REQUIRED: &str = "action_required";

/// Sweep all configured repositories for community PRs blocked on CI approval
///
/// Recomputed from scratch every sweep; there is no persisted classifier
/// state. A failed sub-request skips that PR only, a malformed repository
/// name skips that repository only.
pub async fn check_pending_ci(client: &GitHubClient, cfg: &Config) -> Result<Vec<Finding>> {
    let team = team_members(client, &cfg.internal_team, &cfg.internal_team_ignored_users).await?;
    let skip_users = cfg.skip_user_set();
    let mut findings = Vec::new();

    for check in &cfg.check_repos {
        let repo: RepoName = match check.name.parse() {
            Ok(repo) => repo,
            Err(e) => {
                warn!(repo = %check.name, error = %e, "Skipping repository");
                continue;
            }
        };

        info!(repo = %repo, "Checking repository for pull requests awaiting CI approval");
        let prs = find_prs(
            client,
            &repo,
            &team,
            &skip_users,
            check.minimum_number,
            Mode::Community,
        )
        .await?;

        for pr in prs {
            match classify(client, &team, &pr).await {
                Ok(Classification::PendingCi { last_commit }) => {
                    info!(
                        pr = %pr.html_url,
                        author = %pr.author,
                        last_commit = %last_commit,
                        "Pull request is blocked waiting for CI approval"
                    );
                    findings.push(Finding::new(&pr));
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(pr = %pr.html_url, error = %e, "Could not classify pull request, skipping");
                }
            }
        }
    }

    Ok(findings)
}

/// Classify a single PR
async fn classify(
    client: &GitHubClient,
    team: &HashSet<String>,
    pr: &PullRequestRef,
) -> Result<Classification> {
    let commits: Vec<PrCommit> = client
        .get_all(&format!(
            "/repos/{}/{}/pulls/{}/commits",
            pr.repo.owner, pr.repo.name, pr.number
        ))
        .await?;

    let Some(last_commit) = last_commit_time(&commits) else {
        warn!(pr = %pr.html_url, "Pull request has no dated commits, treating as clean");
        return Ok(Classification::Clean);
    };

    let now = Utc::now();
    if now < last_commit + Duration::hours(CI_GRACE_HOURS) {
        debug!(pr = %pr.html_url, "Inside the post-commit grace window");
        return Ok(Classification::Clean);
    }

    let gated = awaiting_approval(client, pr).await?;
    let engaged = if gated {
        team_engaged_since(client, team, pr, last_commit).await?
    } else {
        false
    };

    Ok(decide(now, last_commit, gated, engaged))
}

/// The classifier decision, separated from the API plumbing
///
/// PendingCi iff the head SHA has an approval-gated run and no team member
/// has engaged since the last commit; anything inside the grace window is
/// clean regardless of workflow state.
fn decide(
    now: DateTime<Utc>,
    last_commit: DateTime<Utc>,
    awaiting_approval: bool,
    team_engaged: bool,
) -> Classification {
    if now < last_commit + Duration::hours(CI_GRACE_HOURS) {
        return Classification::Clean;
    }
    if awaiting_approval && !team_engaged {
        return Classification::PendingCi { last_commit };
    }
    Classification::Clean
}

/// Author timestamp of the newest commit, if any
///
/// The commits endpoint returns oldest-first, so the last entry is the
/// most recent.
fn last_commit_time(commits: &[PrCommit]) -> Option<DateTime<Utc>> {
    commits
        .last()
        .and_then(|c| c.commit.author.as_ref())
        .and_then(|a| a.date)
}

/// Whether any workflow run for the PR's head SHA is gated on approval
///
/// Only the most recent page of runs is consulted; an approval-gated run
/// for a current head SHA is always recent.
async fn awaiting_approval(client: &GitHubClient, pr: &PullRequestRef) -> Result<bool> {
    let runs = client
        .inner()
        .workflows(&pr.repo.owner, &pr.repo.name)
        .list_all_runs()
        .per_page(PER_PAGE as u8)
        .send()
        .await?;

    Ok(runs
        .items
        .iter()
        .any(|run| run.head_sha == pr.head_sha && run.status == ACTION_REQUIRED))
}

/// Whether a team member commented or reviewed after the last commit
async fn team_engaged_since(
    client: &GitHubClient,
    team: &HashSet<String>,
    pr: &PullRequestRef,
    last_commit: DateTime<Utc>,
) -> Result<bool> {
    let mut page = client
        .inner()
        .issues(&pr.repo.owner, &pr.repo.name)
        .list_comments(pr.number)
        .per_page(PER_PAGE as u8)
        .send()
        .await?;

    loop {
        for comment in &page.items {
            if team.contains(&comment.user.login) && comment.created_at > last_commit {
                return Ok(true);
            }
        }
        match client.inner().get_page(&page.next).await? {
            Some(next) => page = next,
            None => break,
        }
    }

    let reviews = client
        .inner()
        .pulls(&pr.repo.owner, &pr.repo.name)
        .list_reviews(pr.number)
        .send()
        .await?;

    for review in &reviews.items {
        let Some(author) = review.user.as_ref().map(|u| u.login.as_str()) else {
            continue;
        };
        let Some(submitted_at) = review.submitted_at else {
            continue;
        };
        if team.contains(author)
            && submitted_at > last_commit
            && is_qualifying_review_state(review.state.as_ref())
        {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Review states that count as a maintainer having engaged
///
/// An approval does not count: an approved PR whose workflows still sit in
/// action_required is exactly the situation worth flagging.
fn is_qualifying_review_state(state: Option<&ReviewState>) -> bool {
    matches!(
        state,
        Some(ReviewState::Dismissed | ReviewState::ChangesRequested | ReviewState::Commented)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CommitDetail, CommitIdentity, CommitVerification};

    fn commit(date: Option<DateTime<Utc>>) -> PrCommit {
        PrCommit {
            commit: CommitDetail {
                author: date.map(|d| CommitIdentity { date: Some(d) }),
                verification: Some(CommitVerification { verified: true }),
            },
        }
    }

    #[test]
    fn test_clean_inside_grace_window() {
        let now = Utc::now();
        let last_commit = now - Duration::hours(1);
        // Workflow state is irrelevant inside the window
        assert_eq!(
            decide(now, last_commit, true, false),
            Classification::Clean
        );
    }

    #[test]
    fn test_pending_when_gated_and_unattended() {
        let now = Utc::now();
        let last_commit = now - Duration::hours(3);
        assert_eq!(
            decide(now, last_commit, true, false),
            Classification::PendingCi { last_commit }
        );
    }

    #[test]
    fn test_clean_when_team_already_engaged() {
        let now = Utc::now();
        let last_commit = now - Duration::hours(3);
        assert_eq!(decide(now, last_commit, true, true), Classification::Clean);
    }

    #[test]
    fn test_clean_when_not_gated() {
        let now = Utc::now();
        let last_commit = now - Duration::days(2);
        assert_eq!(decide(now, last_commit, false, false), Classification::Clean);
    }

    #[test]
    fn test_decision_is_idempotent() {
        let now = Utc::now();
        let last_commit = now - Duration::hours(5);
        let first = decide(now, last_commit, true, false);
        let second = decide(now, last_commit, true, false);
        assert_eq!(first, second);
    }

    #[test]
    fn test_last_commit_time_picks_newest() {
        let old = Utc::now() - Duration::days(3);
        let new = Utc::now() - Duration::hours(4);
        let commits = vec![commit(Some(old)), commit(Some(new))];
        assert_eq!(last_commit_time(&commits), Some(new));
    }

    #[test]
    fn test_last_commit_time_handles_empty_and_undated() {
        assert_eq!(last_commit_time(&[]), None);
        assert_eq!(last_commit_time(&[commit(None)]), None);
    }

    #[test]
    fn test_qualifying_review_states() {
        assert!(is_qualifying_review_state(Some(&ReviewState::Commented)));
        assert!(is_qualifying_review_state(Some(
            &ReviewState::ChangesRequested
        )));
        assert!(is_qualifying_review_state(Some(&ReviewState::Dismissed)));
        assert!(!is_qualifying_review_state(Some(&ReviewState::Approved)));
        assert!(!is_qualifying_review_state(None));
    }
}
