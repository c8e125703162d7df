//! prwatch CLI - sweep GitHub pull requests and nudge the team
//!
//! Each notify subcommand runs one classifier over every configured
//! repository, dedups findings against the state store, and delivers
//! webhook notifications.

mod commands;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use prwatch_core::Config;
use prwatch_db::NotificationKind;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{notify, SuppressArgs, SweepSettings};

/// prwatch: pull request monitoring and notifications
#[derive(Parser, Debug)]
#[command(name = "prwatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file to load (defaults to ~/.config/prwatch/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path (defaults to ~/.cache/prwatch/prwatch.db)
    #[arg(long, global = true, env = "PRWATCH_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Keep sweeping on an interval instead of running once
    #[arg(long = "loop", global = true)]
    repeat: bool,

    /// The amount of time to wait between each iteration of the loop
    #[arg(long, global = true, default_value = "1h", value_parser = humantime::parse_duration)]
    loop_time: Duration,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Notify about community PRs blocked waiting for CI approval
    NotifyPendingCi,

    /// Notify about community PRs with no maintainer activity in 7 days
    NotifyStale,

    /// Notify about PRs containing unsigned commits
    NotifyUnsigned,

    /// Set or clear the notification suppress flag for one PR
    SetSuppress(SuppressArgs),

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let settings = SweepSettings {
        repeat: cli.repeat,
        interval: cli.loop_time,
    };

    match cli.command {
        Commands::NotifyPendingCi => {
            notify::run(
                NotificationKind::PendingCi,
                cli.config.as_deref(),
                cli.db_path,
                settings,
            )
            .await?;
        }
        Commands::NotifyStale => {
            notify::run(
                NotificationKind::Stale,
                cli.config.as_deref(),
                cli.db_path,
                settings,
            )
            .await?;
        }
        Commands::NotifyUnsigned => {
            notify::run(
                NotificationKind::UnsignedCommits,
                cli.config.as_deref(),
                cli.db_path,
                settings,
            )
            .await?;
        }
        Commands::SetSuppress(args) => {
            args.execute(cli.db_path).await?;
        }
        Commands::Config => {
            let config = Config::load_with_overrides(cli.config.as_deref())?;
            println!("prwatch Configuration");
            println!("=====================");
            println!();
            println!("internal_team: {}", config.internal_team);
            println!(
                "internal_team_ignored_users: {}",
                config.internal_team_ignored_users.join(", ")
            );
            println!("skip_users: {}", config.skip_users.join(", "));
            println!();
            println!("Repositories:");
            for repo in &config.check_repos {
                println!("  {} (minimum PR #{})", repo.name, repo.minimum_number);
            }
            if let Some(path) = Config::default_config_path() {
                println!();
                println!("Config file: {}", path.display());
            }
        }
    }

    Ok(())
}
