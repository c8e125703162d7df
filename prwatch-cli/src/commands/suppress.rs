//! Administrative suppress-flag command

use std::path::PathBuf;

use clap::Args;
use prwatch_db::{Database, NotificationKind};
use prwatch_github::RepoName;
use tracing::info;

/// Arguments for `prwatch set-suppress`
#[derive(Args, Debug)]
pub struct SuppressArgs {
    /// Repository in owner/name form
    #[arg(long)]
    repo: String,

    /// Pull request number
    #[arg(long)]
    pr_number: i64,

    /// Which classifier's notifications to affect
    #[arg(long)]
    kind: NotificationKind,

    /// true to silence the PR, false to restore notifications
    #[arg(long, action = clap::ArgAction::Set)]
    suppress: bool,
}

impl SuppressArgs {
    /// Update the suppress flag for one (repository, PR) record
    pub async fn execute(&self, db_path: Option<PathBuf>) -> anyhow::Result<()> {
        // Validate identifying fields before touching the database
        let repo: RepoName = self.repo.parse()?;
        if self.pr_number <= 0 {
            anyhow::bail!("--pr-number must be a positive PR number");
        }

        let db_path = match db_path {
            Some(path) => path,
            None => Database::default_path()?,
        };
        let db = Database::open(&db_path).await?;

        db.notifications(self.kind)
            .set_suppressed(&repo.to_string(), self.pr_number, self.suppress)
            .await?;

        info!(
            repo = %repo,
            pr = self.pr_number,
            suppress = self.suppress,
            "Updated suppress flag"
        );

        Ok(())
    }
}
