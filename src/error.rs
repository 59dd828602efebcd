//! Error types for issue-net.

/// Failure of a single monitor store operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("store {operation} failed: {cause}")]
pub struct StoreError {
    /// Store operation that failed (`put`, `get_all`, ...).
    pub operation: &'static str,
    /// Backend error message.
    pub cause: String,
}

impl StoreError {
    pub fn new(operation: &'static str, cause: impl std::fmt::Display) -> Self {
        Self {
            operation,
            cause: cause.to_string(),
        }
    }
}

/// Errors returned by the monitor lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// The target does not parse into an owner/repo pair.
    #[error("invalid GitHub URL: {url}")]
    InvalidUrl { url: String },

    /// A monitor with this name is already persisted or running.
    #[error("monitor name {name} already exists")]
    DuplicateMonitorName { name: String },

    /// No monitor (or no running task, for `stop`) with this name.
    #[error("monitor {name} not found")]
    MonitorNotFound { name: String },

    /// The polling task could not be spawned.
    #[error("failed to start monitor {name}: {cause}")]
    TaskStart { name: String, cause: String },

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Top-level error type for startup glue (config, filesystem).
#[derive(Debug, thiserror::Error)]
pub enum IssueNetError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Monitor lifecycle error.
    #[error(transparent)]
    Monitor(#[from] MonitorError),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, IssueNetError>;
