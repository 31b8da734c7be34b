//! Logging service - persistent migration history in DuckDB
//!
//! Records which versions each `tally` invocation applied or failed on, in
//! logs.duckdb next to the store. Only versions, command names and error
//! text are recorded; no row data from the budget tables ever ends up here.
//!
//! The log database's own schema is managed by the migration engine with
//! its own packaged set and no legacy map.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::adapters::{DuckDbStore, EmbeddedMigrations};
use crate::domain::LegacyVersionMap;
use crate::ports::{Database, Row, Value};

/// Log database file inside the data directory
pub const LOG_DB_FILE: &str = "logs.duckdb";

pub const COMMAND_EXECUTED: &str = "command_executed";
pub const MIGRATION_APPLIED: &str = "migration_applied";
pub const MIGRATION_FAILED: &str = "migration_failed";

/// Counter for generating unique IDs within the same millisecond
static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// Unique ID: milliseconds in the high bits, a wrapping counter in the low 16
fn generate_id() -> i64 {
    let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed) & 0xFFFF;
    (((now_ms() as u64) << 16 | counter) & (i64::MAX as u64)) as i64
}

fn detect_platform() -> &'static str {
    if cfg!(target_os = "macos") {
        "macos"
    } else if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "linux") {
        "linux"
    } else {
        "unknown"
    }
}

/// An event to be recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub event: &'static str,
    pub command: Option<String>,
    pub version: Option<i64>,
    pub error_message: Option<String>,
    pub error_details: Option<String>,
}

impl LogEvent {
    fn new(event: &'static str) -> Self {
        Self {
            event,
            command: None,
            version: None,
            error_message: None,
            error_details: None,
        }
    }

    /// A `tally` subcommand was invoked
    pub fn command(name: impl Into<String>) -> Self {
        Self {
            command: Some(name.into()),
            ..Self::new(COMMAND_EXECUTED)
        }
    }

    /// A migration committed
    pub fn migration_applied(version: i64) -> Self {
        Self::new(MIGRATION_APPLIED).with_version(version)
    }

    /// A run stopped with an error
    pub fn migration_failed(message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            ..Self::new(MIGRATION_FAILED)
        }
    }

    pub fn with_version(mut self, version: i64) -> Self {
        self.version = Some(version);
        self
    }

    /// Attach the failing statement or other context
    pub fn with_error_details(mut self, details: impl Into<String>) -> Self {
        self.error_details = Some(details.into());
        self
    }
}

/// A stored history entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub timestamp: i64,
    pub app_version: String,
    pub platform: String,
    pub event: String,
    pub command: Option<String>,
    pub version: Option<i64>,
    pub error_message: Option<String>,
    pub error_details: Option<String>,
}

/// Which migration events to return, newest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryFilter {
    /// Only events about this version
    pub version: Option<i64>,
    /// Only `migration_failed` events
    pub failures_only: bool,
    pub limit: usize,
}

impl Default for HistoryFilter {
    fn default() -> Self {
        Self {
            version: None,
            failures_only: false,
            limit: 20,
        }
    }
}

fn text(row: &Row, idx: usize) -> Option<String> {
    row.get(idx).and_then(Value::as_str).map(str::to_string)
}

fn row_to_entry(row: &Row) -> LogEntry {
    LogEntry {
        id: row.first().and_then(Value::as_i64).unwrap_or_default(),
        timestamp: row.get(1).and_then(Value::as_i64).unwrap_or_default(),
        app_version: text(row, 2).unwrap_or_default(),
        platform: text(row, 3).unwrap_or_default(),
        event: text(row, 4).unwrap_or_default(),
        command: text(row, 5),
        version: row.get(6).and_then(Value::as_i64),
        error_message: text(row, 7),
        error_details: text(row, 8),
    }
}

/// Writes and queries the migration history
pub struct LoggingService {
    store: DuckDbStore,
    app_version: String,
    platform: &'static str,
}

impl LoggingService {
    /// Open or create logs.duckdb in `data_dir` and bring its schema up to date
    pub fn new(data_dir: &Path, app_version: impl Into<String>) -> Result<Self> {
        let db_path = data_dir.join(LOG_DB_FILE);
        let store = DuckDbStore::open(&db_path)
            .with_context(|| format!("Failed to open log database {}", db_path.display()))?;

        store
            .run_migrations(&EmbeddedMigrations::event_log(), LegacyVersionMap::empty())
            .context("Failed to migrate log database")?;

        Ok(Self {
            store,
            app_version: app_version.into(),
            platform: detect_platform(),
        })
    }

    pub fn log(&self, event: LogEvent) -> Result<()> {
        self.store.exec(
            "INSERT INTO sys_logs (
                id, timestamp, app_version, platform,
                event, command, version, error_message, error_details
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            &[
                Value::from(generate_id()),
                Value::from(now_ms()),
                Value::from(self.app_version.as_str()),
                Value::from(self.platform),
                Value::from(event.event),
                Value::from(event.command),
                Value::from(event.version),
                Value::from(event.error_message),
                Value::from(event.error_details),
            ],
        )?;
        Ok(())
    }

    /// Applied and failed migration events matching `filter`
    ///
    /// Command invocations are not part of the history.
    pub fn migration_history(&self, filter: &HistoryFilter) -> Result<Vec<LogEntry>> {
        let mut sql = String::from(
            "SELECT id, timestamp, app_version, platform,
                    event, command, version, error_message, error_details
             FROM sys_logs",
        );
        let mut args = Vec::new();

        if filter.failures_only {
            sql.push_str(" WHERE event = ?");
            args.push(Value::from(MIGRATION_FAILED));
        } else {
            sql.push_str(" WHERE event IN (?, ?)");
            args.push(Value::from(MIGRATION_APPLIED));
            args.push(Value::from(MIGRATION_FAILED));
        }
        if let Some(version) = filter.version {
            sql.push_str(" AND version = ?");
            args.push(Value::from(version));
        }
        sql.push_str(" ORDER BY timestamp DESC, id DESC LIMIT ?");
        args.push(Value::from(filter.limit as i64));

        let rows = self
            .store
            .query(&sql, &args)
            .context("Failed to read migration history")?;
        Ok(rows.iter().map(row_to_entry).collect())
    }
}
