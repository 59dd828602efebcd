//! Configuration types for issue-net.
//!
//! Secrets are never stored here; tokens come from the environment.

use crate::error::IssueNetError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the GitHub token.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Environment variable holding the Discord bot token.
pub const DISCORD_TOKEN_ENV: &str = "DISCORD_BOT_TOKEN";

/// Environment variable overriding the config file path.
pub const CONFIG_PATH_ENV: &str = "ISSUE_NET_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueNetConfig {
    pub database: DatabaseConfig,
    /// Polling settings shared by all monitors.
    pub monitor: MonitorConfig,
    pub github: GitHubConfig,
    pub discord: DiscordConfig,
    pub logging: LoggingConfig,
}

/// Monitor store location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file (None = `<data dir>/issue-net.db`).
    pub path: Option<PathBuf>,
}

impl DatabaseConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(crate::app_dirs::database_path)
    }
}

/// Polling cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Delay between poll cycles of one monitor, in seconds.
    pub poll_interval_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
        }
    }
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

/// GitHub REST API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub api_base_url: String,
    /// HTTP timeout per request, in seconds.
    pub timeout_secs: u64,
    pub per_page: u8,
    /// Custom User-Agent (None = `issue-net/<version>`).
    pub user_agent: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.github.com".to_owned(),
            timeout_secs: 30,
            per_page: 100,
            user_agent: None,
        }
    }
}

impl GitHubConfig {
    /// Client settings for `token`.
    pub fn client_config(&self, token: impl Into<String>) -> crate::github::GitHubClientConfig {
        let mut cfg = crate::github::GitHubClientConfig::new(token)
            .with_base_url(self.api_base_url.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_per_page(self.per_page);
        if let Some(ua) = &self.user_agent {
            cfg = cfg.with_user_agent(ua.clone());
        }
        cfg
    }
}

/// Discord REST API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    pub api_base_url: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://discord.com/api/v10".to_owned(),
        }
    }
}

impl DiscordConfig {
    pub fn notifier_config(
        &self,
        bot_token: impl Into<String>,
    ) -> crate::notify::DiscordNotifierConfig {
        crate::notify::DiscordNotifierConfig::new(bot_token)
            .with_api_base_url(self.api_base_url.clone())
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset (e.g. `info`, `issue_net=debug`).
    pub level: String,
    /// Also write daily rotated log files.
    pub file_logging: bool,
    /// Log directory (None = `<data dir>/logs`).
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            file_logging: true,
            directory: None,
        }
    }
}

impl IssueNetConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| IssueNetError::Config(e.to_string()))
    }

    /// Load from `path` when it exists, otherwise return defaults.
    pub fn load_or_default(path: &Path) -> crate::error::Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    pub fn save_to_file(&self, path: &Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| IssueNetError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// `$ISSUE_NET_CONFIG`, or `config.toml` in the config directory.
    pub fn default_config_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
            return PathBuf::from(path);
        }
        crate::app_dirs::config_dir().join("config.toml")
    }
}
