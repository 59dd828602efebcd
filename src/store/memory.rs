//! Map-backed monitor store.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::MonitorStore;
use crate::error::StoreError;
use crate::monitor::{Monitor, MonitorStatus};

/// Non-persistent [`MonitorStore`]; records live for the lifetime of the value.
#[derive(Debug, Default)]
pub struct InMemoryMonitorStore {
    monitors: Mutex<BTreeMap<String, Monitor>>,
}

impl InMemoryMonitorStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
        operation: &'static str,
    ) -> Result<MutexGuard<'_, BTreeMap<String, Monitor>>, StoreError> {
        self.monitors
            .lock()
            .map_err(|e| StoreError::new(operation, format!("lock poisoned: {e}")))
    }
}

impl MonitorStore for InMemoryMonitorStore {
    fn put(&self, monitor: &Monitor) -> Result<(), StoreError> {
        self.lock("put")?
            .insert(monitor.name.clone(), monitor.clone());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), StoreError> {
        self.lock("delete")?.remove(name);
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Option<Monitor>, StoreError> {
        Ok(self.lock("get")?.get(name).cloned())
    }

    fn get_all(&self) -> Result<Vec<Monitor>, StoreError> {
        Ok(self.lock("get_all")?.values().cloned().collect())
    }

    fn update_checkpoint(
        &self,
        name: &str,
        checkpoint: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if let Some(m) = self.lock("update_checkpoint")?.get_mut(name) {
            m.checkpoint = m.checkpoint.max(checkpoint);
        }
        Ok(())
    }

    fn update_status(&self, name: &str, status: MonitorStatus) -> Result<(), StoreError> {
        if let Some(m) = self.lock("update_status")?.get_mut(name) {
            m.status = status;
        }
        Ok(())
    }
}
