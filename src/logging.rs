//! Tracing subscriber setup for the daemon.
//!
//! Human-readable output always goes to stderr. With file logging enabled a
//! second layer writes daily rotated files through a non-blocking writer.

use crate::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// File name prefix for rotated log files (`issue-net.log.YYYY-MM-DD`).
pub const LOG_FILE_PREFIX: &str = "issue-net.log";

/// Build the filter: `RUST_LOG` wins, then the configured level.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// The returned guard must be held for the life of the process when file
/// logging is on; dropping it flushes and stops the background writer.
///
/// # Errors
///
/// Fails when the log directory cannot be created or a global subscriber is
/// already installed.
pub fn init(config: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    if !config.file_logging {
        tracing_subscriber::registry()
            .with(env_filter(config))
            .with(stderr_layer)
            .try_init()?;
        return Ok(None);
    }

    let dir = config
        .directory
        .clone()
        .unwrap_or_else(crate::app_dirs::logs_dir);
    std::fs::create_dir_all(&dir)?;

    let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file_layer = fmt::layer().with_writer(writer).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    Ok(Some(guard))
}
