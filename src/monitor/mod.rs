//! Monitor scheduling engine.
//!
//! - `types`: persisted [`Monitor`] records and [`MonitorStatus`].
//! - `repo`: GitHub URL parsing into [`RepoRef`].
//! - `task`: the per-monitor [`PollingTask`] loop.
//! - `manager`: the [`MonitorManager`] lifecycle controller.
//! - `recovery`: boot-time resumption of running monitors.

pub mod manager;
pub mod recovery;
pub mod repo;
pub mod task;
pub mod types;

pub use manager::MonitorManager;
pub use recovery::RecoveryReport;
pub use repo::RepoRef;
pub use task::{Clock, CycleOutcome, PollingTask, TaskContext, system_clock};
pub use types::{Monitor, MonitorSpec, MonitorStatus};
