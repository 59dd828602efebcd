//! Per-monitor polling loop.
//!
//! A [`PollingTask`] owns one monitor's checkpoint. Each cycle asks the
//! issue source for issues since the checkpoint; a non-empty answer
//! advances the checkpoint (in memory and in the store) and produces
//! exactly one notification. Source and notifier failures are logged and
//! absorbed so they never end the loop.

use crate::github::{IssueFilter, IssueSource};
use crate::monitor::RepoRef;
use crate::notify::Notifier;
use crate::store::MonitorStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Default delay between the end of one cycle and the start of the next.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Time source for checkpoints.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Wall-clock [`Clock`].
pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Collaborators shared by every polling task.
#[derive(Clone)]
pub struct TaskContext {
    pub store: Arc<dyn MonitorStore>,
    pub source: Arc<dyn IssueSource>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Clock,
    pub poll_interval: Duration,
}

/// Result of a single poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The source call failed; nothing changed.
    SourceFailed,
    /// No new issues; checkpoint unchanged.
    Empty,
    /// `count` issues found, checkpoint advanced, one notification attempted.
    Delivered { count: usize },
    /// Cancellation was observed before any side effect.
    Cancelled,
}

/// One running unit bound to one monitor.
pub struct PollingTask {
    name: String,
    repo: RepoRef,
    destination: String,
    filter: IssueFilter,
    checkpoint: DateTime<Utc>,
    ctx: TaskContext,
}

impl PollingTask {
    pub fn new(
        name: impl Into<String>,
        repo: RepoRef,
        destination: impl Into<String>,
        filter: Option<IssueFilter>,
        checkpoint: DateTime<Utc>,
        ctx: TaskContext,
    ) -> Self {
        Self {
            name: name.into(),
            repo,
            destination: destination.into(),
            filter: filter.unwrap_or_default(),
            checkpoint,
            ctx,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current in-memory checkpoint.
    pub fn checkpoint(&self) -> DateTime<Utc> {
        self.checkpoint
    }

    /// Run cycles until `cancel` fires. The first cycle starts immediately.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(repo = %self.repo, since = %self.checkpoint, "polling task started");
        loop {
            if cancel.is_cancelled() {
                break;
            }
            if self.poll_once(&cancel).await == CycleOutcome::Cancelled {
                break;
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.ctx.poll_interval) => {}
            }
        }
        info!(repo = %self.repo, "polling task stopped");
    }

    /// Execute one poll cycle.
    pub async fn poll_once(&mut self, cancel: &CancellationToken) -> CycleOutcome {
        let filter = self.filter.with_since(self.checkpoint);
        debug!(repo = %self.repo, since = %self.checkpoint, "searching for issues");

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return CycleOutcome::Cancelled,
            result = self.ctx.source.fetch_issues(&self.repo, &filter) => result,
        };

        let issues = match fetched {
            Ok(issues) => issues,
            Err(e) => {
                warn!(repo = %self.repo, error = %e, "issue source failed; skipping cycle");
                return CycleOutcome::SourceFailed;
            }
        };

        if issues.is_empty() {
            debug!(repo = %self.repo, "no new issues");
            return CycleOutcome::Empty;
        }

        // A stop may have landed while the fetch completed; its status write
        // must stay the last write for this monitor.
        if cancel.is_cancelled() {
            return CycleOutcome::Cancelled;
        }

        let next = (self.ctx.clock)().max(self.checkpoint);
        self.checkpoint = next;
        if let Err(e) = self.ctx.store.update_checkpoint(&self.name, next) {
            error!(error = %e, "cannot persist checkpoint");
        }

        info!(repo = %self.repo, count = issues.len(), "found new issues");
        if let Err(e) = self
            .ctx
            .notifier
            .send(&self.destination, &issues, &self.repo)
            .await
        {
            warn!(
                notifier = self.ctx.notifier.id(),
                error = %e,
                "notification failed"
            );
        }

        CycleOutcome::Delivered {
            count: issues.len(),
        }
    }
}
