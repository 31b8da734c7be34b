//! Version registry - the persistent record of applied migrations

use std::collections::BTreeSet;

use chrono::NaiveDateTime;

use crate::domain::result::{Error, Result};
use crate::domain::{AppliedMigrationRecord, LegacyVersionMap};
use crate::ports::{Database, Row, Value};

/// Name of the metadata table
pub const METADATA_TABLE: &str = "schema_migrations";

// BIGINT because DuckDB's INTEGER is 32-bit and versions are date-coded
const CREATE_METADATA_TABLE: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version BIGINT PRIMARY KEY,
    description VARCHAR NOT NULL,
    applied_at TIMESTAMP DEFAULT current_timestamp
)";

/// Parse a DuckDB `TIMESTAMP::VARCHAR` value
fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

/// Tracks which versions a store has applied
pub struct VersionRegistry<'a> {
    db: &'a dyn Database,
    legacy: &'a LegacyVersionMap,
}

impl<'a> VersionRegistry<'a> {
    pub fn new(db: &'a dyn Database, legacy: &'a LegacyVersionMap) -> Self {
        Self { db, legacy }
    }

    /// Create the metadata table if it does not exist yet
    pub fn ensure_metadata_table(&self) -> Result<()> {
        self.db
            .exec(CREATE_METADATA_TABLE, &[])
            .map_err(|e| Error::metadata(format!("cannot create {}: {}", METADATA_TABLE, e)))
    }

    /// Versions recorded in the metadata table, as stored
    pub fn applied_versions(&self) -> Result<BTreeSet<i64>> {
        let rows = self
            .db
            .query("SELECT version FROM schema_migrations", &[])
            .map_err(|e| Error::metadata(format!("cannot read {}: {}", METADATA_TABLE, e)))?;

        rows.iter()
            .map(|row| {
                row.first().and_then(Value::as_i64).ok_or_else(|| {
                    Error::metadata(format!("unexpected version cell {:?}", row.first()))
                })
            })
            .collect()
    }

    /// Recorded versions plus every version a recorded legacy version stands in for
    pub fn effective_applied(&self) -> Result<BTreeSet<i64>> {
        let recorded = self.applied_versions()?;
        Ok(self.legacy.resolve(&recorded))
    }

    /// Insert the record for a version
    ///
    /// Runs on the caller's open transaction; the row only becomes visible
    /// when the caller commits.
    pub fn record_applied(&self, version: i64, description: &str) -> Result<()> {
        self.db
            .exec(
                "INSERT INTO schema_migrations (version, description) VALUES (?, ?)",
                &[Value::from(version), Value::from(description)],
            )
            .map_err(|e| Error::metadata(format!("cannot record version {}: {}", version, e)))
    }

    /// Every recorded row, ordered by version
    pub fn records(&self) -> Result<Vec<AppliedMigrationRecord>> {
        let rows = self
            .db
            .query(
                "SELECT version, description, applied_at::VARCHAR
                 FROM schema_migrations
                 ORDER BY version",
                &[],
            )
            .map_err(|e| Error::metadata(format!("cannot read {}: {}", METADATA_TABLE, e)))?;

        rows.iter().map(row_to_record).collect()
    }
}

fn row_to_record(row: &Row) -> Result<AppliedMigrationRecord> {
    // Columns: 0: version, 1: description, 2: applied_at
    let version = row
        .first()
        .and_then(Value::as_i64)
        .ok_or_else(|| Error::metadata(format!("malformed metadata row {:?}", row)))?;
    let description = row
        .get(1)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let applied_at = row.get(2).and_then(Value::as_str).and_then(parse_timestamp);

    Ok(AppliedMigrationRecord {
        version,
        description,
        applied_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::DuckDbStore;
    use crate::domain::CONSOLIDATED_VERSION;

    #[test]
    fn test_ensure_metadata_table_is_idempotent() {
        let store = DuckDbStore::open_in_memory().unwrap();
        let legacy = LegacyVersionMap::empty();
        let registry = VersionRegistry::new(&store, &legacy);

        registry.ensure_metadata_table().unwrap();
        registry.record_applied(20251129001, "2025-11-29-001").unwrap();
        registry.ensure_metadata_table().unwrap();

        assert_eq!(registry.applied_versions().unwrap().len(), 1);
    }

    #[test]
    fn test_records_carry_timestamp() {
        let store = DuckDbStore::open_in_memory().unwrap();
        let legacy = LegacyVersionMap::empty();
        let registry = VersionRegistry::new(&store, &legacy);
        registry.ensure_metadata_table().unwrap();

        registry.record_applied(20251207001, "2025-12-07-001").unwrap();
        registry.record_applied(20251129001, "2025-11-29-001").unwrap();

        let records = registry.records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].version, 20251129001);
        assert_eq!(records[0].description, "2025-11-29-001");
        assert!(records[0].applied_at.is_some());
        assert_eq!(records[1].version, 20251207001);
    }

    #[test]
    fn test_duplicate_record_is_rejected() {
        let store = DuckDbStore::open_in_memory().unwrap();
        let legacy = LegacyVersionMap::empty();
        let registry = VersionRegistry::new(&store, &legacy);
        registry.ensure_metadata_table().unwrap();

        registry.record_applied(20251129001, "2025-11-29-001").unwrap();
        let err = registry.record_applied(20251129001, "2025-11-29-001").unwrap_err();
        assert!(matches!(err, Error::Metadata(_)));
    }

    #[test]
    fn test_effective_applied_resolves_legacy_rows() {
        let store = DuckDbStore::open_in_memory().unwrap();
        let legacy = LegacyVersionMap::builtin();
        let registry = VersionRegistry::new(&store, &legacy);
        registry.ensure_metadata_table().unwrap();

        for v in [1, 2, 3] {
            registry.record_applied(v, &format!("00{}_legacy", v)).unwrap();
        }

        let raw = registry.applied_versions().unwrap();
        assert!(!raw.contains(&CONSOLIDATED_VERSION));

        let effective = registry.effective_applied().unwrap();
        assert!(effective.contains(&CONSOLIDATED_VERSION));
    }

    #[test]
    fn test_query_before_table_exists_is_metadata_error() {
        let store = DuckDbStore::open_in_memory().unwrap();
        let legacy = LegacyVersionMap::empty();
        let registry = VersionRegistry::new(&store, &legacy);

        assert!(matches!(registry.applied_versions(), Err(Error::Metadata(_))));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2025-11-29 08:15:00.123456").is_some());
        assert!(parse_timestamp("2025-11-29 08:15:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
