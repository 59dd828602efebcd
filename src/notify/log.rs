//! Log-only notifier, used when no chat credentials are configured.

use crate::github::Issue;
use crate::monitor::RepoRef;
use crate::notify::{Notifier, format_issue_message};
use async_trait::async_trait;
use tracing::info;

/// Writes each batch to the log instead of delivering it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn id(&self) -> &'static str {
        "log"
    }

    async fn send(
        &self,
        destination: &str,
        issues: &[Issue],
        repo: &RepoRef,
    ) -> anyhow::Result<()> {
        info!(
            destination,
            repo = %repo,
            count = issues.len(),
            "notification:\n{}",
            format_issue_message(issues, repo)
        );
        Ok(())
    }
}
