//! Sweep loop driver and notification dispatch

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use prwatch_core::Config;
use prwatch_db::{evaluate, Database, GateDecision, NotificationKind, NotificationStore};
use prwatch_github::{check_pending_ci, check_stale, check_unsigned, Finding, GitHubClient};
use prwatch_notify::Notifier;
use tracing::{debug, error, info};

/// Pause after a failed webhook send so repeated failures do not trip the
/// channel's own rate limit
const NOTIFY_FAILURE_BACKOFF: Duration = Duration::from_secs(15);

/// Loop behavior shared by the notify subcommands
#[derive(Debug, Clone, Copy)]
pub struct SweepSettings {
    /// Keep sweeping instead of running once
    pub repeat: bool,
    /// Sleep between sweeps
    pub interval: Duration,
}

/// Run one classifier's sweep loop
///
/// Config and database problems here are fatal; everything past startup is
/// logged and survived. There is no mid-sweep cancellation - a sweep always
/// runs to completion before the loop can end.
pub async fn run(
    kind: NotificationKind,
    config_path: Option<&Path>,
    db_path: Option<PathBuf>,
    settings: SweepSettings,
) -> anyhow::Result<()> {
    let config = Config::load_with_overrides(config_path)?;

    let db_path = match db_path {
        Some(path) => path,
        None => Database::default_path()?,
    };
    let db = Database::open(&db_path).await?;
    let store = db.notifications(kind);

    let client = GitHubClient::new()?;
    let notifier = Notifier::from_env()?;

    loop {
        info!(sweep = describe(kind), "Starting sweep");

        match sweep(kind, &client, &config).await {
            Ok(findings) => {
                info!(count = findings.len(), "Sweep finished");
                dispatch(&store, &notifier, kind, &findings).await;
            }
            Err(e) => {
                error!(error = %e, "Sweep failed");
            }
        }

        if !settings.repeat {
            break;
        }

        info!(duration = ?settings.interval, "Waiting for next iteration");
        tokio::time::sleep(settings.interval).await;
    }

    Ok(())
}

async fn sweep(
    kind: NotificationKind,
    client: &GitHubClient,
    config: &Config,
) -> prwatch_github::Result<Vec<Finding>> {
    match kind {
        NotificationKind::PendingCi => check_pending_ci(client, config).await,
        NotificationKind::Stale => check_stale(client, config).await,
        NotificationKind::UnsignedCommits => check_unsigned(client, config).await,
    }
}

fn describe(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::PendingCi => "community PRs waiting for CI approval",
        NotificationKind::Stale => "community PRs with no recent maintainer activity",
        NotificationKind::UnsignedCommits => "PRs with unsigned commits",
    }
}

fn message_title(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::PendingCi => {
            "The following pull request is waiting for approval for CI checks to run"
        }
        NotificationKind::Stale => {
            "The following pull request has had no maintainer activity in the last 7 days"
        }
        NotificationKind::UnsignedCommits => {
            "The following pull request has unsigned commits"
        }
    }
}

/// Push each finding through the dedup gate and deliver what survives
///
/// The record is written before the send: a failed send under-notifies for
/// one interval rather than double-notifying, which is the cheaper failure.
async fn dispatch(
    store: &NotificationStore,
    notifier: &Notifier,
    kind: NotificationKind,
    findings: &[Finding],
) {
    for finding in findings {
        let pr_number = finding.number as i64;

        let record = match store.get(&finding.repo, pr_number).await {
            Ok(record) => record,
            Err(e) => {
                error!(repo = %finding.repo, pr = pr_number, error = %e, "Error checking PR info in database");
                continue;
            }
        };

        match evaluate(record.as_ref(), Utc::now()) {
            GateDecision::Suppressed => {
                debug!(repo = %finding.repo, pr = pr_number, "Messages suppressed for this PR");
            }
            GateDecision::Throttled => {
                debug!(repo = %finding.repo, pr = pr_number, "Already notified within the interval");
            }
            GateDecision::Notify => {
                if let Err(e) = store.upsert(&finding.repo, pr_number).await {
                    error!(repo = %finding.repo, pr = pr_number, error = %e, "Error storing PR data");
                    continue;
                }

                if let Err(e) = notifier.send("message", message_title(kind), &finding.url).await {
                    error!(error = %e, "Failed to send message");
                    tokio::time::sleep(NOTIFY_FAILURE_BACKOFF).await;
                } else {
                    info!(pr = %finding.url, "Message sent for PR");
                }
            }
        }
    }
}
