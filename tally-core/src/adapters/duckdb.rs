//! DuckDB store implementation of the `Database` port

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use duckdb::types::Value as DuckValue;
use duckdb::{params_from_iter, Connection};

use crate::domain::result::{Error, Result};
use crate::domain::LegacyVersionMap;
use crate::ports::{Database, MigrationFileProvider, Row, Value};
use crate::services::{MigrationReport, MigrationRunner};

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

fn to_duckdb(value: &Value) -> DuckValue {
    match value {
        Value::Null => DuckValue::Null,
        Value::Integer(i) => DuckValue::BigInt(*i),
        Value::Real(f) => DuckValue::Double(*f),
        Value::Text(s) => DuckValue::Text(s.clone()),
    }
}

/// Convert a result cell to a port value
///
/// Temporal, decimal, blob and nested types have no port representation;
/// select them as `col::VARCHAR` instead.
fn from_duckdb(value: DuckValue, column: usize) -> Result<Value> {
    let out_of_range = |v: &dyn std::fmt::Display| {
        Error::database(format!("column {}: {} does not fit in BIGINT", column, v))
    };
    Ok(match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(b) => Value::Integer(b as i64),
        DuckValue::TinyInt(i) => Value::Integer(i as i64),
        DuckValue::SmallInt(i) => Value::Integer(i as i64),
        DuckValue::Int(i) => Value::Integer(i as i64),
        DuckValue::BigInt(i) => Value::Integer(i),
        DuckValue::HugeInt(i) => Value::Integer(i64::try_from(i).map_err(|_| out_of_range(&i))?),
        DuckValue::UTinyInt(i) => Value::Integer(i as i64),
        DuckValue::USmallInt(i) => Value::Integer(i as i64),
        DuckValue::UInt(i) => Value::Integer(i as i64),
        DuckValue::UBigInt(i) => Value::Integer(i64::try_from(i).map_err(|_| out_of_range(&i))?),
        DuckValue::Float(f) => Value::Real(f as f64),
        DuckValue::Double(f) => Value::Real(f),
        DuckValue::Text(s) | DuckValue::Enum(s) => Value::Text(s),
        other => {
            return Err(Error::database(format!(
                "column {}: unsupported type {:?}; cast it to VARCHAR",
                column,
                other.data_type()
            )))
        }
    })
}

/// DuckDB-backed store
///
/// Holds a single connection behind a mutex so the transaction opened by
/// `begin` covers every statement issued until `commit`/`rollback`.
pub struct DuckDbStore {
    conn: Mutex<Connection>,
}

impl DuckDbStore {
    /// Open (or create) a database file
    ///
    /// Includes retry logic with exponential backoff for file locking errors,
    /// which can occur when another process still holds the file during
    /// startup.
    pub fn open(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        tracing::warn!(
                            "Database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::database(format!("Failed to open database after {} retries", MAX_RETRIES))
        }))
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn try_open_connection(db_path: &Path) -> Result<Connection> {
        // Extension autoloading stays off; nothing here needs one and cached
        // extensions can fail code signing on macOS.
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Ok(Connection::open_with_flags(db_path, config)?)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::database(format!("Lock poisoned: {}", e)))
    }

    /// Apply every pending migration from `provider`
    pub fn run_migrations(
        &self,
        provider: &dyn MigrationFileProvider,
        legacy: LegacyVersionMap,
    ) -> Result<MigrationReport> {
        MigrationRunner::new(self, provider, legacy).run()
    }

    /// Check whether a table exists in the main schema
    pub fn table_exists(&self, table_name: &str) -> Result<bool> {
        let rows = self.query(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
            &[Value::from(table_name)],
        )?;
        Ok(rows
            .first()
            .and_then(|row| row.first())
            .and_then(Value::as_i64)
            .unwrap_or(0)
            > 0)
    }
}

impl Database for DuckDbStore {
    fn exec(&self, sql: &str, args: &[Value]) -> Result<()> {
        let conn = self.lock()?;
        if args.is_empty() {
            conn.execute_batch(sql)?;
        } else {
            conn.execute(sql, params_from_iter(args.iter().map(to_duckdb)))?;
        }
        Ok(())
    }

    fn query(&self, sql: &str, args: &[Value]) -> Result<Vec<Row>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(args.iter().map(to_duckdb)))?;

        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let mut cells = Vec::new();
            for idx in 0.. {
                match row.get::<usize, DuckValue>(idx) {
                    Ok(v) => cells.push(from_duckdb(v, idx)?),
                    Err(duckdb::Error::InvalidColumnIndex(_)) => break,
                    Err(e) => return Err(e.into()),
                }
            }
            result.push(cells);
        }
        Ok(result)
    }

    fn begin(&self) -> Result<()> {
        self.lock()?.execute_batch("BEGIN TRANSACTION")?;
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        self.lock()?.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        self.lock()?.execute_batch("ROLLBACK")?;
        Ok(())
    }
}
