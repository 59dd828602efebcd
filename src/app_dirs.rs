//! Centralized application directory paths.
//!
//! Uses the [`dirs`] crate for platform-appropriate directory resolution.
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | Data | `~/Library/Application Support/issue-net/` | `~/.local/share/issue-net/` |
//! | Config | `~/Library/Application Support/issue-net/` | `~/.config/issue-net/` |
//!
//! # Environment Overrides
//!
//! - `ISSUE_NET_DATA_DIR` overrides [`data_dir`]
//! - `ISSUE_NET_CONFIG_DIR` overrides [`config_dir`]

use std::path::PathBuf;

const APP_DIR_NAME: &str = "issue-net";

/// Application data root (database, logs).
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("ISSUE_NET_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("/tmp/issue-net-data"))
}

/// Application config directory (`config.toml`).
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("ISSUE_NET_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("/tmp/issue-net-config"))
}

/// Log file directory (`data_dir()/logs/`).
#[must_use]
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Default SQLite database path (`data_dir()/issue-net.db`).
#[must_use]
pub fn database_path() -> PathBuf {
    data_dir().join(crate::store::sqlite::DB_FILENAME)
}
