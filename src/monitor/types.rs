//! Persisted monitor records and their status.

use crate::github::IssueFilter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Persisted monitor status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorStatus {
    Running,
    #[default]
    Stopped,
    Error,
}

impl MonitorStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MonitorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "stopped" => Ok(Self::Stopped),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown monitor status: {other}")),
        }
    }
}

/// A named watcher bound to one repository and one notification destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monitor {
    /// Unique, case-sensitive key.
    pub name: String,
    /// Repository URL as supplied by the user.
    pub url: String,
    /// Items up to this instant have been processed.
    pub checkpoint: DateTime<Utc>,
    #[serde(default)]
    pub filter: Option<IssueFilter>,
    #[serde(default)]
    pub status: MonitorStatus,
    /// Notification target (Discord channel id).
    pub destination: String,
}

/// Caller-supplied parameters for [`MonitorManager::start`].
///
/// [`MonitorManager::start`]: crate::monitor::MonitorManager::start
#[derive(Debug, Clone)]
pub struct MonitorSpec {
    pub name: String,
    pub url: String,
    pub destination: String,
    pub checkpoint: DateTime<Utc>,
    pub filter: Option<IssueFilter>,
}

impl MonitorSpec {
    /// Checkpoint defaults to the current time.
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            destination: destination.into(),
            checkpoint: Utc::now(),
            filter: None,
        }
    }

    pub fn with_checkpoint(mut self, checkpoint: DateTime<Utc>) -> Self {
        self.checkpoint = checkpoint;
        self
    }

    pub fn with_filter(mut self, filter: IssueFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub(crate) fn into_monitor(self, status: MonitorStatus) -> Monitor {
        Monitor {
            name: self.name,
            url: self.url,
            checkpoint: self.checkpoint,
            filter: self.filter,
            status,
            destination: self.destination,
        }
    }
}
