//! Notification sinks for discovered issues.
//!
//! Design goal: sinks are pluggable. Polling tasks only see the
//! [`Notifier`] trait and treat every failure as best-effort.

pub mod discord;
pub mod format;
pub mod log;

pub use discord::{DiscordNotifier, DiscordNotifierConfig};
pub use format::format_issue_message;
pub use log::LogNotifier;

use crate::github::Issue;
use crate::monitor::RepoRef;
use async_trait::async_trait;

/// Notifier contract. New sinks only need to implement this trait.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Stable sink identifier (e.g. `discord`, `log`).
    fn id(&self) -> &'static str;

    /// Deliver one batch of issues for `repo` to `destination`.
    async fn send(&self, destination: &str, issues: &[Issue], repo: &RepoRef)
    -> anyhow::Result<()>;
}
