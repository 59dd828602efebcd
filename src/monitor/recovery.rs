//! Boot-time resumption of monitors persisted as `running`.

use crate::error::MonitorError;
use crate::monitor::manager::{MonitorManager, parse_repo};
use crate::monitor::MonitorStatus;
use tracing::{error, info, warn};

/// Outcome of [`MonitorManager::recover`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Monitors whose polling task was resumed.
    pub resumed: Vec<String>,
    /// Monitors that could not be resumed, with the reason.
    pub skipped: Vec<(String, String)>,
}

impl MonitorManager {
    /// Resume every monitor whose persisted status is `running`, each from
    /// its last saved checkpoint.
    ///
    /// A bad URL or a failed spawn skips that monitor only; a failed spawn
    /// also marks it `error`. Already-active monitors are left alone.
    ///
    /// # Errors
    ///
    /// [`MonitorError::Store`] if the registry cannot be read.
    pub async fn recover(&self) -> Result<RecoveryReport, MonitorError> {
        let running: Vec<_> = self
            .store
            .get_all()?
            .into_iter()
            .filter(|m| m.status == MonitorStatus::Running)
            .collect();
        info!(count = running.len(), "restoring running monitors");

        let mut report = RecoveryReport::default();
        for monitor in running {
            let _guard = self.lock_name(&monitor.name).await;
            if self.is_active(&monitor.name) {
                continue;
            }

            let repo = match parse_repo(&monitor.url) {
                Ok(repo) => repo,
                Err(e) => {
                    warn!(monitor = %monitor.name, error = %e, "skipping monitor");
                    report.skipped.push((monitor.name, e.to_string()));
                    continue;
                }
            };

            match self.spawn(&monitor, repo) {
                Ok(task) => {
                    self.table().insert(monitor.name.clone(), task);
                    report.resumed.push(monitor.name);
                }
                Err(e) => {
                    error!(monitor = %monitor.name, error = %e, "cannot resume monitor");
                    if let Err(store_err) = self
                        .store
                        .update_status(&monitor.name, MonitorStatus::Error)
                    {
                        error!(monitor = %monitor.name, error = %store_err, "cannot mark monitor as failed");
                    }
                    report.skipped.push((monitor.name, e.to_string()));
                }
            }
        }

        info!(
            resumed = report.resumed.len(),
            skipped = report.skipped.len(),
            "monitor recovery complete"
        );
        Ok(report)
    }
}
