//! Stale-PR classifier
//!
//! Flags community PRs with no qualifying maintainer timeline activity in
//! the last seven days.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use prwatch_core::Config;
use serde::Deserialize;
use tracing::{info, warn};

use crate::client::PER_PAGE;
use crate::{
    find_prs, team_members, Classification, Finding, GitHubClient, Mode, PullRequestRef, RepoName,
    Result,
};

/// Days without maintainer activity before a PR counts as stale
const STALE_WINDOW_DAYS: i64 = 7;

/// One entry from the issue timeline endpoint
///
/// Timeline events carry their timestamp in one of two places: most events
/// use `created_at`, reviews use `submitted_at`. The same split applies to
/// the acting user (`actor` vs `user`).
#[derive(Debug, Clone, Deserialize)]
struct TimelineEvent {
    actor: Option<EventActor>,
    user: Option<EventActor>,
    created_at: Option<DateTime<Utc>>,
    submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
struct EventActor {
    login: String,
}

impl TimelineEvent {
    fn actor_login(&self) -> Option<&str> {
        self.actor
            .as_ref()
            .or(self.user.as_ref())
            .map(|a| a.login.as_str())
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.created_at.or(self.submitted_at)
    }
}

/// Sweep all configured repositories for stale community PRs
pub async fn check_stale(client: &GitHubClient, cfg: &Config) -> Result<Vec<Finding>> {
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

        info!(repo = %repo, "Checking repository for stale pull requests");
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
                Ok(Classification::Stale) => {
                    info!(
                        pr = %pr.html_url,
                        author = %pr.author,
                        "No maintainer activity in the stale window"
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
///
/// Pages the issue timeline and stops at the first qualifying event rather
/// than exhausting every page.
async fn classify(
    client: &GitHubClient,
    team: &HashSet<String>,
    pr: &PullRequestRef,
) -> Result<Classification> {
    let cutoff = Utc::now() - Duration::days(STALE_WINDOW_DAYS);

    // A PR younger than the window cannot be stale
    if pr.created_at > cutoff {
        return Ok(Classification::Clean);
    }

    let route = format!(
        "/repos/{}/{}/issues/{}/timeline",
        pr.repo.owner, pr.repo.name, pr.number
    );

    let mut page = 1;
    loop {
        let events: Vec<TimelineEvent> = client.get_page_of(&route, page).await?;

        if has_recent_team_activity(&events, team, cutoff) {
            return Ok(Classification::Clean);
        }

        if events.len() < PER_PAGE {
            break;
        }
        page += 1;
    }

    Ok(Classification::Stale)
}

/// Whether any event is by a team member and inside the window
///
/// Events with no resolvable actor or timestamp are evidence of nothing
/// and are skipped.
fn has_recent_team_activity(
    events: &[TimelineEvent],
    team: &HashSet<String>,
    cutoff: DateTime<Utc>,
) -> bool {
    events.iter().any(|event| {
        let Some(actor) = event.actor_login() else {
            return false;
        };
        let Some(timestamp) = event.timestamp() else {
            return false;
        };
        team.contains(actor) && timestamp > cutoff
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team() -> HashSet<String> {
        ["maintainer".to_string()].into_iter().collect()
    }

    fn comment_event(login: &str, at: DateTime<Utc>) -> TimelineEvent {
        TimelineEvent {
            actor: Some(EventActor {
                login: login.to_string(),
            }),
            user: None,
            created_at: Some(at),
            submitted_at: None,
        }
    }

    fn review_event(login: &str, at: DateTime<Utc>) -> TimelineEvent {
        TimelineEvent {
            actor: None,
            user: Some(EventActor {
                login: login.to_string(),
            }),
            created_at: None,
            submitted_at: Some(at),
        }
    }

    #[test]
    fn test_recent_team_comment_counts() {
        let cutoff = Utc::now() - Duration::days(STALE_WINDOW_DAYS);
        let events = vec![comment_event("maintainer", Utc::now() - Duration::days(2))];
        assert!(has_recent_team_activity(&events, &team(), cutoff));
    }

    #[test]
    fn test_review_timestamp_read_from_submitted_at() {
        let cutoff = Utc::now() - Duration::days(STALE_WINDOW_DAYS);
        let events = vec![review_event("maintainer", Utc::now() - Duration::days(3))];
        assert!(has_recent_team_activity(&events, &team(), cutoff));
    }

    #[test]
    fn test_old_team_activity_does_not_count() {
        let cutoff = Utc::now() - Duration::days(STALE_WINDOW_DAYS);
        let events = vec![comment_event("maintainer", Utc::now() - Duration::days(10))];
        assert!(!has_recent_team_activity(&events, &team(), cutoff));
    }

    #[test]
    fn test_recent_community_activity_does_not_count() {
        let cutoff = Utc::now() - Duration::days(STALE_WINDOW_DAYS);
        let events = vec![comment_event("drive-by", Utc::now() - Duration::hours(6))];
        assert!(!has_recent_team_activity(&events, &team(), cutoff));
    }

    #[test]
    fn test_events_without_actor_or_timestamp_are_skipped() {
        let cutoff = Utc::now() - Duration::days(STALE_WINDOW_DAYS);
        let no_actor = TimelineEvent {
            actor: None,
            user: None,
            created_at: Some(Utc::now()),
            submitted_at: None,
        };
        let no_timestamp = TimelineEvent {
            actor: Some(EventActor {
                login: "maintainer".to_string(),
            }),
            user: None,
            created_at: None,
            submitted_at: None,
        };
        assert!(!has_recent_team_activity(
            &[no_actor, no_timestamp],
            &team(),
            cutoff
        ));
    }
}
