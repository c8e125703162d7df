//! Database layer for prwatch
//!
//! Persists one row per (repository, PR number) per classifier, tracking
//! when a notification was last sent and whether a maintainer has silenced
//! that PR.

pub mod error;
pub mod gate;
pub mod store;

use std::path::{Path, PathBuf};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

pub use error::{Error, Result};
pub use gate::{evaluate, renotify_interval, GateDecision};
pub use store::{NotificationKind, NotificationRecord, NotificationStore};

/// Database connection pool
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if missing) the database at a file path
    ///
    /// Schema bootstrap runs here; a failure is fatal to startup. The pool
    /// is capped at a single connection - sweeps are strictly sequential
    /// and the store makes no concurrent-access promises beyond the
    /// conflict-clause upsert.
    pub async fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Io(format!("Failed to create database directory: {}", e)))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.ensure_schema().await?;

        Ok(db)
    }

    /// Get the default database path (~/.cache/prwatch/prwatch.db)
    pub fn default_path() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| Error::Io("Could not determine cache directory".to_string()))?;
        Ok(cache_dir.join("prwatch").join("prwatch.db"))
    }

    /// Get the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get the store for one classifier's notification state
    pub fn notifications(&self, kind: NotificationKind) -> NotificationStore {
        NotificationStore::new(self.pool.clone(), kind)
    }

    /// Create or extend every classifier table
    ///
    /// Idempotent: tables are created if missing, and columns added after
    /// the table first shipped are bolted on individually. Additive only -
    /// nothing is dropped or rewritten.
    async fn ensure_schema(&self) -> Result<()> {
        for kind in NotificationKind::ALL {
            let table = kind.table();

            sqlx::query(&format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    repo TEXT NOT NULL,
                    pr_number INTEGER NOT NULL,
                    last_message_sent TEXT NOT NULL,
                    suppress_messages INTEGER NOT NULL DEFAULT 0,
                    UNIQUE(repo, pr_number)
                )"
            ))
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Migration(e.to_string()))?;

            // Columns added after the initial schema; checked one by one
            let required_columns = [("suppress_messages", "INTEGER NOT NULL DEFAULT 0")];

            for (column, definition) in required_columns {
                let (present,): (i64,) = sqlx::query_as(&format!(
                    "SELECT COUNT(*) FROM pragma_table_info('{table}') WHERE name = ?"
                ))
                .bind(column)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| Error::Migration(e.to_string()))?;

                if present == 0 {
                    sqlx::query(&format!(
                        "ALTER TABLE {table} ADD COLUMN {column} {definition}"
                    ))
                    .execute(&self.pool)
                    .await
                    .map_err(|e| Error::Migration(e.to_string()))?;
                    info!(table = table, column = column, "Added column to table");
                }
            }
        }

        Ok(())
    }
}
