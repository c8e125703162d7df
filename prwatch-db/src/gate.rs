//! Notification dedup gate
//!
//! Every classifier's dispatch loop runs its findings through this same
//! decision. Records are never cleared when a condition resolves, so a
//! resolve-then-recur lands in the cadence branch rather than the
//! first-sighting branch: staleness of the record, not the PR's current
//! health, drives re-notification.

use chrono::{DateTime, Duration, Utc};

use crate::NotificationRecord;

/// Minimum gap in hours between repeat notifications for the same PR and
/// condition
const RENOTIFY_HOURS: i64 = 24;

/// Minimum gap between repeat notifications
pub fn renotify_interval() -> Duration {
    Duration::hours(RENOTIFY_HOURS)
}

/// What the dispatcher should do with one finding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Record the send time and deliver the notification
    Notify,
    /// A maintainer silenced this PR; no send, no record update
    Suppressed,
    /// Already notified inside the interval; try again next sweep
    Throttled,
}

/// Decide whether a freshly classified condition should fire
pub fn evaluate(record: Option<&NotificationRecord>, now: DateTime<Utc>) -> GateDecision {
    match record {
        // First sighting always notifies
        None => GateDecision::Notify,
        Some(record) if record.suppress_messages => GateDecision::Suppressed,
        Some(record) if now - record.last_message_sent > renotify_interval() => {
            GateDecision::Notify
        }
        Some(_) => GateDecision::Throttled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sent_ago: Duration, suppressed: bool) -> NotificationRecord {
        NotificationRecord {
            repo: "acme/widget".to_string(),
            pr_number: 42,
            last_message_sent: Utc::now() - sent_ago,
            suppress_messages: suppressed,
        }
    }

    #[test]
    fn test_first_sighting_notifies() {
        assert_eq!(evaluate(None, Utc::now()), GateDecision::Notify);
    }

    #[test]
    fn test_within_interval_is_throttled() {
        let record = record(Duration::hours(1), false);
        assert_eq!(evaluate(Some(&record), Utc::now()), GateDecision::Throttled);
    }

    #[test]
    fn test_after_interval_notifies_again() {
        let record = record(Duration::hours(25), false);
        assert_eq!(evaluate(Some(&record), Utc::now()), GateDecision::Notify);
    }

    #[test]
    fn test_suppression_beats_everything() {
        let fresh = record(Duration::hours(1), true);
        let old = record(Duration::days(30), true);
        assert_eq!(evaluate(Some(&fresh), Utc::now()), GateDecision::Suppressed);
        assert_eq!(evaluate(Some(&old), Utc::now()), GateDecision::Suppressed);
    }

    #[test]
    fn test_exact_boundary_does_not_renotify() {
        let now = Utc::now();
        let record = NotificationRecord {
            repo: "acme/widget".to_string(),
            pr_number: 42,
            last_message_sent: now - renotify_interval(),
            suppress_messages: false,
        };
        // Strictly greater than the interval is required
        assert_eq!(evaluate(Some(&record), now), GateDecision::Throttled);
    }
}
