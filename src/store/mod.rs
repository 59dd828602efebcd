//! Persistent monitor registry.
//!
//! Sub-modules:
//! - `schema`: SQLite DDL definitions.
//! - `sqlite`: SQLite-backed [`SqliteMonitorStore`].
//! - `memory`: map-backed [`InMemoryMonitorStore`].
//!
//! The store performs no uniqueness checks of its own; the monitor manager
//! enforces unique names before calling [`MonitorStore::put`].

pub mod memory;
pub(crate) mod schema;
pub mod sqlite;

pub use memory::InMemoryMonitorStore;
pub use sqlite::SqliteMonitorStore;

use crate::error::StoreError;
use crate::monitor::{Monitor, MonitorStatus};
use chrono::{DateTime, Utc};

/// Storage operations consumed by the monitor manager and polling tasks.
///
/// Updates addressed to an unknown name are no-ops, not errors.
pub trait MonitorStore: Send + Sync {
    /// Insert or fully overwrite the record keyed by `monitor.name`.
    fn put(&self, monitor: &Monitor) -> Result<(), StoreError>;

    fn delete(&self, name: &str) -> Result<(), StoreError>;

    fn get(&self, name: &str) -> Result<Option<Monitor>, StoreError>;

    /// All records, ordered by name.
    fn get_all(&self) -> Result<Vec<Monitor>, StoreError>;

    /// Advance the persisted checkpoint. Never moves it backward.
    fn update_checkpoint(&self, name: &str, checkpoint: DateTime<Utc>)
    -> Result<(), StoreError>;

    fn update_status(&self, name: &str, status: MonitorStatus) -> Result<(), StoreError>;
}
