//! SQLite-backed monitor store.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use super::MonitorStore;
use super::schema::{apply_schema, read_schema_version};
use crate::error::StoreError;
use crate::github::IssueFilter;
use crate::monitor::{Monitor, MonitorStatus};

/// Default database filename within the data directory.
pub const DB_FILENAME: &str = "issue-net.db";

const SELECT_COLUMNS: &str = "SELECT name, url, last_check, channel_id, filters, status FROM monitors";

/// SQLite-backed [`MonitorStore`].
///
/// Thread-safe via an internal `Mutex<Connection>`; every statement is
/// short, so callers on the async runtime use it directly.
pub struct SqliteMonitorStore {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl SqliteMonitorStore {
    /// Open (or create) the database file at `path`, creating parent
    /// directories and applying the schema.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::new("open", e))?;
        }
        let conn = Connection::open(path).map_err(|e| StoreError::new("open", e))?;
        apply_schema(&conn).map_err(|e| StoreError::new("open", e))?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            conn: Mutex::new(conn),
        })
    }

    /// Private in-memory database, mainly for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::new("open", e))?;
        apply_schema(&conn).map_err(|e| StoreError::new("open", e))?;
        Ok(Self {
            path: None,
            conn: Mutex::new(conn),
        })
    }

    /// Database file path, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn schema_version(&self) -> Result<Option<u32>, StoreError> {
        let conn = self.lock("schema_version")?;
        read_schema_version(&conn).map_err(|e| StoreError::new("schema_version", e))
    }

    fn lock(
        &self,
        operation: &'static str,
    ) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::new(operation, format!("lock poisoned: {e}")))
    }
}

impl MonitorStore for SqliteMonitorStore {
    fn put(&self, monitor: &Monitor) -> Result<(), StoreError> {
        let filters = monitor
            .filter
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StoreError::new("put", e))?;

        let conn = self.lock("put")?;
        conn.execute(
            "INSERT INTO monitors (name, url, last_check, channel_id, filters, status) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
             ON CONFLICT(name) DO UPDATE SET \
             url = excluded.url, last_check = excluded.last_check, \
             channel_id = excluded.channel_id, filters = excluded.filters, \
             status = excluded.status",
            params![
                monitor.name,
                monitor.url,
                format_timestamp(monitor.checkpoint),
                monitor.destination,
                filters,
                monitor.status.as_str(),
            ],
        )
        .map_err(|e| StoreError::new("put", e))?;
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), StoreError> {
        let conn = self.lock("delete")?;
        conn.execute("DELETE FROM monitors WHERE name = ?1", params![name])
            .map_err(|e| StoreError::new("delete", e))?;
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Option<Monitor>, StoreError> {
        let conn = self.lock("get")?;
        conn.query_row(
            &format!("{SELECT_COLUMNS} WHERE name = ?1"),
            params![name],
            row_to_monitor,
        )
        .optional()
        .map_err(|e| StoreError::new("get", e))
    }

    fn get_all(&self) -> Result<Vec<Monitor>, StoreError> {
        let conn = self.lock("get_all")?;
        let mut stmt = conn
            .prepare(&format!("{SELECT_COLUMNS} ORDER BY name"))
            .map_err(|e| StoreError::new("get_all", e))?;
        let rows = stmt
            .query_map([], row_to_monitor)
            .map_err(|e| StoreError::new("get_all", e))?;

        let mut monitors = Vec::new();
        for r in rows {
            monitors.push(r.map_err(|e| StoreError::new("get_all", e))?);
        }
        Ok(monitors)
    }

    fn update_checkpoint(
        &self,
        name: &str,
        checkpoint: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let conn = self.lock("update_checkpoint")?;
        // Fixed-width RFC 3339 strings compare in chronological order.
        conn.execute(
            "UPDATE monitors SET last_check = ?1 WHERE name = ?2 AND last_check <= ?1",
            params![format_timestamp(checkpoint), name],
        )
        .map_err(|e| StoreError::new("update_checkpoint", e))?;
        Ok(())
    }

    fn update_status(&self, name: &str, status: MonitorStatus) -> Result<(), StoreError> {
        let conn = self.lock("update_status")?;
        conn.execute(
            "UPDATE monitors SET status = ?1 WHERE name = ?2",
            params![status.as_str(), name],
        )
        .map_err(|e| StoreError::new("update_status", e))?;
        Ok(())
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn conversion_error(
    column: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(err))
}

fn row_to_monitor(row: &rusqlite::Row<'_>) -> rusqlite::Result<Monitor> {
    let last_check: String = row.get(2)?;
    let filters: Option<String> = row.get(4)?;
    let status: Option<String> = row.get(5)?;

    let checkpoint = DateTime::parse_from_rfc3339(&last_check)
        .map_err(|e| conversion_error(2, e))?
        .with_timezone(&Utc);
    let filter = filters
        .map(|json| serde_json::from_str::<IssueFilter>(&json))
        .transpose()
        .map_err(|e| conversion_error(4, e))?;
    let status = match status {
        Some(s) => s
            .parse::<MonitorStatus>()
            .map_err(|e| conversion_error(5, std::io::Error::other(e)))?,
        None => MonitorStatus::Stopped,
    };

    Ok(Monitor {
        name: row.get(0)?,
        url: row.get(1)?,
        checkpoint,
        filter,
        status,
        destination: row.get(3)?,
    })
}
