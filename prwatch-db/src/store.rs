//! Per-classifier notification state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::{Error, Result};

/// Which classifier a notification record belongs to
///
/// Each classifier keeps its own table so the same PR can be tracked
/// independently per condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    PendingCi,
    Stale,
    UnsignedCommits,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 3] = [
        NotificationKind::PendingCi,
        NotificationKind::Stale,
        NotificationKind::UnsignedCommits,
    ];

    /// Table backing this classifier's records
    pub fn table(self) -> &'static str {
        match self {
            NotificationKind::PendingCi => "pending_ci_status",
            NotificationKind::Stale => "stale_pr_status",
            NotificationKind::UnsignedCommits => "unsigned_commit_status",
        }
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending-ci" => Ok(NotificationKind::PendingCi),
            "stale" => Ok(NotificationKind::Stale),
            "unsigned" => Ok(NotificationKind::UnsignedCommits),
            other => Err(format!(
                "unknown kind '{other}' (expected pending-ci, stale or unsigned)"
            )),
        }
    }
}

/// One (repository, PR number) row
///
/// Rows are created on the first classification hit and updated on every
/// subsequent one; they are never deleted, even after the PR closes.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NotificationRecord {
    pub repo: String,
    pub pr_number: i64,
    pub last_message_sent: DateTime<Utc>,
    pub suppress_messages: bool,
}

/// Store for one classifier's notification records
pub struct NotificationStore {
    pool: SqlitePool,
    kind: NotificationKind,
}

impl NotificationStore {
    pub fn new(pool: SqlitePool, kind: NotificationKind) -> Self {
        Self { pool, kind }
    }

    /// Fetch the record for a PR; absent is a valid non-error result
    pub async fn get(&self, repo: &str, pr_number: i64) -> Result<Option<NotificationRecord>> {
        let record = sqlx::query_as::<_, NotificationRecord>(&format!(
            "SELECT repo, pr_number, last_message_sent, suppress_messages
             FROM {}
             WHERE repo = ? AND pr_number = ?",
            self.kind.table()
        ))
        .bind(repo)
        .bind(pr_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Record that a notification was sent now
    ///
    /// Inserts a fresh row or, if one exists, updates only
    /// `last_message_sent`. The conflict clause makes the write atomic at
    /// the row level; `suppress_messages` is never touched here.
    pub async fn upsert(&self, repo: &str, pr_number: i64) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO {} (repo, pr_number, last_message_sent, suppress_messages)
             VALUES (?, ?, ?, 0)
             ON CONFLICT(repo, pr_number)
             DO UPDATE SET last_message_sent = excluded.last_message_sent",
            self.kind.table()
        ))
        .bind(repo)
        .bind(pr_number)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        debug!(repo = repo, pr = pr_number, table = self.kind.table(), "Recorded notification time");
        Ok(())
    }

    /// Administrative: silence or unsilence a PR
    ///
    /// Independent of classification; only this operation ever writes the
    /// flag. The row must already exist.
    pub async fn set_suppressed(&self, repo: &str, pr_number: i64, suppress: bool) -> Result<()> {
        let result = sqlx::query(&format!(
            "UPDATE {} SET suppress_messages = ? WHERE repo = ? AND pr_number = ?",
            self.kind.table()
        ))
        .bind(suppress)
        .bind(repo)
        .bind(pr_number)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "no record for {} PR #{} in {}",
                repo,
                pr_number,
                self.kind.table()
            )));
        }

        if suppress {
            info!(repo = repo, pr = pr_number, "Messages suppressed for PR");
        } else {
            info!(repo = repo, pr = pr_number, "Messages unsuppressed for PR");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, Database) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::open(temp_dir.path().join("test.db")).await.unwrap();
        (temp_dir, db)
    }

    #[tokio::test]
    async fn test_get_absent_is_none_not_error() {
        let (_tmp, db) = setup().await;
        let store = db.notifications(NotificationKind::Stale);

        let record = store.get("acme/widget", 42).await.unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_updates() {
        let (_tmp, db) = setup().await;
        let store = db.notifications(NotificationKind::Stale);

        store.upsert("acme/widget", 42).await.unwrap();
        let first = store.get("acme/widget", 42).await.unwrap().unwrap();
        assert_eq!(first.repo, "acme/widget");
        assert_eq!(first.pr_number, 42);
        assert!(!first.suppress_messages);

        store.upsert("acme/widget", 42).await.unwrap();
        let second = store.get("acme/widget", 42).await.unwrap().unwrap();
        assert!(second.last_message_sent >= first.last_message_sent);

        // Still one row, not two
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM stale_pr_status WHERE repo = ? AND pr_number = ?")
                .bind("acme/widget")
                .bind(42i64)
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_upsert_preserves_suppress_flag() {
        let (_tmp, db) = setup().await;
        let store = db.notifications(NotificationKind::PendingCi);

        store.upsert("acme/widget", 7).await.unwrap();
        store.set_suppressed("acme/widget", 7, true).await.unwrap();

        store.upsert("acme/widget", 7).await.unwrap();
        let record = store.get("acme/widget", 7).await.unwrap().unwrap();
        assert!(record.suppress_messages);
    }

    #[tokio::test]
    async fn test_set_suppressed_requires_existing_row() {
        let (_tmp, db) = setup().await;
        let store = db.notifications(NotificationKind::UnsignedCommits);

        let err = store.set_suppressed("acme/widget", 99, true).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_kinds_are_isolated() {
        let (_tmp, db) = setup().await;
        let stale = db.notifications(NotificationKind::Stale);
        let pending = db.notifications(NotificationKind::PendingCi);

        stale.upsert("acme/widget", 42).await.unwrap();
        assert!(pending.get("acme/widget", 42).await.unwrap().is_none());
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(
            "pending-ci".parse::<NotificationKind>().unwrap(),
            NotificationKind::PendingCi
        );
        assert_eq!(
            "stale".parse::<NotificationKind>().unwrap(),
            NotificationKind::Stale
        );
        assert_eq!(
            "unsigned".parse::<NotificationKind>().unwrap(),
            NotificationKind::UnsignedCommits
        );
        assert!("other".parse::<NotificationKind>().is_err());
    }
}
