//! Configuration management for prwatch
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (PRWATCH_*)
//! 3. Config file (~/.config/prwatch/config.toml)
//! 4. Default values

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A repository to sweep, with the lowest PR number worth looking at.
///
/// PRs below `minimum_number` predate the bot and are never inspected;
/// discovery relies on this to stop paging early.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckRepo {
    /// Repository in `owner/name` form
    pub name: String,

    /// Smallest PR number the sweep will consider
    #[serde(default)]
    pub minimum_number: u64,
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Team whose members count as internal, in `org/slug` form
    pub internal_team: String,

    /// Team members excluded from the internal set (bots, service accounts)
    pub internal_team_ignored_users: Vec<String>,

    /// Authors whose PRs are never treated as community PRs
    pub skip_users: Vec<String>,

    /// Repositories to sweep
    pub check_repos: Vec<CheckRepo>,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if the file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/prwatch/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("prwatch").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - PRWATCH_INTERNAL_TEAM: team in `org/slug` form
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(team) = std::env::var("PRWATCH_INTERNAL_TEAM") {
            self.internal_team = team;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load()?,
        };

        let config = config.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants a sweep relies on before any network call is made
    pub fn validate(&self) -> Result<()> {
        if self.internal_team.is_empty() {
            return Err(Error::Config(
                "internal_team must be set (org/slug)".to_string(),
            ));
        }
        if self.check_repos.is_empty() {
            return Err(Error::Config(
                "check_repos must list at least one repository".to_string(),
            ));
        }
        Ok(())
    }

    /// The skip-user list as a set, built once per sweep
    pub fn skip_user_set(&self) -> HashSet<String> {
        self.skip_users.iter().cloned().collect()
    }
}
