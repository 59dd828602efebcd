//! Monitor lifecycle controller.
//!
//! [`MonitorManager`] is the only writer of the active task table. Every
//! operation first takes a per-name async lock, so `start`, `stop`,
//! `restart` and `remove` for the same name never interleave while
//! operations on different names run in parallel. The table itself sits
//! behind a plain mutex that is never held across an await.

use crate::error::MonitorError;
use crate::github::IssueSource;
use crate::monitor::task::{Clock, DEFAULT_POLL_INTERVAL, PollingTask, TaskContext, system_clock};
use crate::monitor::{Monitor, MonitorSpec, MonitorStatus, RepoRef};
use crate::notify::Notifier;
use crate::store::MonitorStore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, warn};

/// Handle to a live polling task.
pub(crate) struct ActiveTask {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl ActiveTask {
    /// Signal cancellation and wait until the task has finished.
    async fn cancel_and_join(self, name: &str) {
        self.cancel.cancel();
        if let Err(e) = self.join.await {
            if e.is_panic() {
                error!(monitor = name, "polling task panicked: {e}");
            }
        }
    }
}

type NameLocks = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

fn lock_map(locks: &NameLocks) -> MutexGuard<'_, HashMap<String, Arc<tokio::sync::Mutex<()>>>> {
    locks
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Exclusive hold on one monitor name.
///
/// Dropping it releases the name and forgets its lock once no other
/// operation is waiting on it.
pub(crate) struct NameGuard<'a> {
    locks: &'a NameLocks,
    name: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for NameGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = lock_map(self.locks);
        // Waiters clone the Arc under this map lock, so a count of one
        // means nobody else can reach this entry.
        if locks
            .get(&self.name)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.name);
        }
    }
}

/// Lifecycle controller for issue monitors.
pub struct MonitorManager {
    pub(crate) store: Arc<dyn MonitorStore>,
    ctx: TaskContext,
    active: Mutex<HashMap<String, ActiveTask>>,
    name_locks: NameLocks,
}

impl MonitorManager {
    /// Create a manager with the default poll interval and the system clock.
    pub fn new(
        store: Arc<dyn MonitorStore>,
        source: Arc<dyn IssueSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let ctx = TaskContext {
            store: store.clone(),
            source,
            notifier,
            clock: system_clock(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        };
        Self {
            store,
            ctx,
            active: Mutex::new(HashMap::new()),
            name_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Override the delay between poll cycles.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.ctx.poll_interval = interval;
        self
    }

    /// Override the checkpoint clock (useful for testing).
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.ctx.clock = clock;
        self
    }

    /// Create, persist and start a new monitor.
    ///
    /// # Errors
    ///
    /// - [`MonitorError::InvalidUrl`] when the URL is not a GitHub repository
    ///   (nothing is written).
    /// - [`MonitorError::DuplicateMonitorName`] when a record or a live task
    ///   already uses the name (nothing is written).
    /// - [`MonitorError::TaskStart`] when the task cannot be spawned; the
    ///   record is left with status `error`.
    /// - [`MonitorError::Store`] on persistence failure.
    pub async fn start(&self, spec: MonitorSpec) -> Result<(), MonitorError> {
        let repo = parse_repo(&spec.url)?;
        let _guard = self.lock_name(&spec.name).await;

        if self.is_active(&spec.name) || self.store.get(&spec.name)?.is_some() {
            return Err(MonitorError::DuplicateMonitorName { name: spec.name });
        }

        let monitor = spec.into_monitor(MonitorStatus::Running);
        self.store.put(&monitor)?;

        let task = self.spawn_or_mark_error(&monitor, repo)?;
        self.table().insert(monitor.name.clone(), task);
        info!(monitor = %monitor.name, url = %monitor.url, "monitor started");
        Ok(())
    }

    /// Stop a running monitor and persist status `stopped`.
    ///
    /// Returns once the task has observed cancellation, so the status write
    /// is the final write for this monitor.
    ///
    /// # Errors
    ///
    /// [`MonitorError::MonitorNotFound`] when no task is active for `name`.
    pub async fn stop(&self, name: &str) -> Result<(), MonitorError> {
        let _guard = self.lock_name(name).await;

        let task = self
            .table()
            .remove(name)
            .ok_or_else(|| MonitorError::MonitorNotFound {
                name: name.to_owned(),
            })?;
        task.cancel_and_join(name).await;

        self.store.update_status(name, MonitorStatus::Stopped)?;
        info!(monitor = name, "monitor stopped");
        Ok(())
    }

    /// Resume a persisted monitor from its last saved checkpoint.
    ///
    /// Succeeds without side effects when the monitor is already running.
    ///
    /// # Errors
    ///
    /// - [`MonitorError::MonitorNotFound`] when no record exists.
    /// - [`MonitorError::InvalidUrl`] when the stored URL no longer parses.
    /// - [`MonitorError::TaskStart`] when the task cannot be spawned.
    /// - [`MonitorError::Store`] on persistence failure.
    pub async fn restart(&self, name: &str) -> Result<(), MonitorError> {
        let _guard = self.lock_name(name).await;

        let monitor = self
            .store
            .get(name)?
            .ok_or_else(|| MonitorError::MonitorNotFound {
                name: name.to_owned(),
            })?;
        let repo = parse_repo(&monitor.url)?;

        if self.is_active(name) {
            info!(monitor = name, "monitor already running");
            return Ok(());
        }
        self.reap_finished(name).await;

        let task = self.spawn_or_mark_error(&monitor, repo)?;
        if let Err(e) = self.store.update_status(name, MonitorStatus::Running) {
            task.cancel_and_join(name).await;
            return Err(e.into());
        }
        self.table().insert(name.to_owned(), task);
        info!(monitor = name, since = %monitor.checkpoint, "monitor restarted");
        Ok(())
    }

    /// All persisted monitors, optionally restricted to one status.
    pub async fn list(
        &self,
        status: Option<MonitorStatus>,
    ) -> Result<Vec<Monitor>, MonitorError> {
        let monitors = self.store.get_all()?;
        Ok(match status {
            Some(wanted) => monitors.into_iter().filter(|m| m.status == wanted).collect(),
            None => monitors,
        })
    }

    /// Stop (if running) and delete a monitor.
    ///
    /// # Errors
    ///
    /// [`MonitorError::MonitorNotFound`] when no record exists.
    pub async fn remove(&self, name: &str) -> Result<(), MonitorError> {
        let _guard = self.lock_name(name).await;

        if self.store.get(name)?.is_none() {
            return Err(MonitorError::MonitorNotFound {
                name: name.to_owned(),
            });
        }
        let task = self.table().remove(name);
        if let Some(task) = task {
            task.cancel_and_join(name).await;
        }
        self.store.delete(name)?;
        info!(monitor = name, "monitor removed");
        Ok(())
    }

    /// Cancel and join every live task without touching persisted statuses,
    /// so the same monitors are resumed by the next recovery.
    pub async fn shutdown(&self) {
        let drained: Vec<(String, ActiveTask)> = self.table().drain().collect();
        let count = drained.len();
        futures_util::future::join_all(
            drained
                .into_iter()
                .map(|(name, task)| async move { task.cancel_and_join(&name).await }),
        )
        .await;
        info!(count, "all polling tasks stopped");
    }

    /// Whether a live task is registered for `name`.
    pub fn is_active(&self, name: &str) -> bool {
        self.table()
            .get(name)
            .is_some_and(|task| !task.join.is_finished())
    }

    /// Names with a registered task, sorted.
    pub fn active_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.table().keys().cloned().collect();
        names.sort();
        names
    }

    pub(crate) fn table(&self) -> MutexGuard<'_, HashMap<String, ActiveTask>> {
        // A poisoned table only means a panic elsewhere mid-insert; the map
        // itself is still consistent.
        self.active
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub(crate) async fn lock_name(&self, name: &str) -> NameGuard<'_> {
        let lock = lock_map(&self.name_locks)
            .entry(name.to_owned())
            .or_default()
            .clone();
        NameGuard {
            locks: &self.name_locks,
            name: name.to_owned(),
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Drop a table entry whose task already ended on its own.
    async fn reap_finished(&self, name: &str) {
        let stale = self.table().remove(name);
        if let Some(task) = stale {
            warn!(monitor = name, "replacing finished polling task");
            task.cancel_and_join(name).await;
        }
    }

    /// Spawn a polling task seeded from `monitor.checkpoint`.
    pub(crate) fn spawn(
        &self,
        monitor: &Monitor,
        repo: RepoRef,
    ) -> Result<ActiveTask, MonitorError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| MonitorError::TaskStart {
            name: monitor.name.clone(),
            cause: e.to_string(),
        })?;

        let cancel = CancellationToken::new();
        let task = PollingTask::new(
            monitor.name.clone(),
            repo,
            monitor.destination.clone(),
            monitor.filter.clone(),
            monitor.checkpoint,
            self.ctx.clone(),
        );
        let span = info_span!("monitor", name = %monitor.name);
        let join = runtime.spawn(task.run(cancel.clone()).instrument(span));
        Ok(ActiveTask { cancel, join })
    }

    fn spawn_or_mark_error(
        &self,
        monitor: &Monitor,
        repo: RepoRef,
    ) -> Result<ActiveTask, MonitorError> {
        self.spawn(monitor, repo).inspect_err(|e| {
            error!(monitor = %monitor.name, error = %e, "cannot spawn polling task");
            if let Err(store_err) = self.store.update_status(&monitor.name, MonitorStatus::Error) {
                error!(monitor = %monitor.name, error = %store_err, "cannot mark monitor as failed");
            }
        })
    }
}

pub(crate) fn parse_repo(url: &str) -> Result<RepoRef, MonitorError> {
    RepoRef::parse(url).ok_or_else(|| MonitorError::InvalidUrl {
        url: url.to_owned(),
    })
}
