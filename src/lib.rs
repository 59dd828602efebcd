//! issue-net: GitHub issue monitors that post new issues to Discord.
//!
//! Each monitor polls one repository's issues endpoint, keeps a checkpoint
//! of the last time it reported anything, and forwards issues created after
//! that checkpoint to a notification destination.
//!
//! # Architecture
//!
//! - **Store**: durable monitor registry (`store`), SQLite or in-memory
//! - **Source**: issue fetching behind the `IssueSource` trait (`github`)
//! - **Notifier**: message delivery behind the `Notifier` trait (`notify`)
//! - **Manager**: lifecycle of the per-monitor polling tasks (`monitor`)
//!
//! Running monitors survive a process restart: `MonitorManager::recover`
//! resumes every monitor persisted as `running` from its saved checkpoint.

pub mod app_dirs;
pub mod config;
pub mod error;
pub mod github;
pub mod logging;
pub mod monitor;
pub mod notify;
pub mod store;

pub use config::IssueNetConfig;
pub use error::{IssueNetError, MonitorError, Result, StoreError};
pub use github::{GitHubClient, GitHubClientConfig, Issue, IssueFilter, IssueSource};
pub use monitor::{Monitor, MonitorManager, MonitorSpec, MonitorStatus, RecoveryReport, RepoRef};
pub use notify::Notifier;
pub use store::{InMemoryMonitorStore, MonitorStore, SqliteMonitorStore};
