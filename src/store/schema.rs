//! SQLite DDL definitions for the monitor store.
//!
//! All `CREATE TABLE` statements live here so they are reviewable and
//! testable in isolation.

use rusqlite::Connection;

/// Current schema version written to `schema_meta`.
pub(crate) const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Complete DDL for the monitor database.
///
/// Uses `IF NOT EXISTS` throughout so `apply_schema` is idempotent.
pub(crate) const SCHEMA_SQL: &str = r#"
-- Enable WAL mode for concurrent reads during writes.
PRAGMA journal_mode = WAL;

-- Schema version tracking.
CREATE TABLE IF NOT EXISTS schema_meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- One row per monitor, keyed by its user-chosen name.
CREATE TABLE IF NOT EXISTS monitors (
    name       TEXT PRIMARY KEY NOT NULL,
    url        TEXT NOT NULL,
    last_check TEXT NOT NULL,            -- RFC 3339 UTC, millisecond precision
    channel_id TEXT NOT NULL,
    filters    TEXT,                     -- JSON IssueFilter, nullable
    status     TEXT DEFAULT 'stopped'
);

CREATE INDEX IF NOT EXISTS idx_monitors_status ON monitors(status);
"#;

/// Apply the full schema to an open connection.
///
/// Safe to call multiple times. Seeds the schema version if not already
/// present.
pub(crate) fn apply_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', ?1)",
        rusqlite::params![CURRENT_SCHEMA_VERSION.to_string()],
    )?;
    Ok(())
}

/// Read the current schema version from the database.
///
/// Returns `None` if the key is missing.
pub(crate) fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<u32>> {
    let mut stmt = conn.prepare("SELECT value FROM schema_meta WHERE key = 'schema_version'")?;
    let mut rows = stmt.query([])?;
    match rows.next()? {
        Some(row) => {
            let val: String = row.get(0)?;
            Ok(val.parse::<u32>().ok())
        }
        None => Ok(None),
    }
}
