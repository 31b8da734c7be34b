//! Integration tests for the migration engine
//!
//! These run the engine end to end against on-disk DuckDB stores, with
//! migration sets supplied from temp directories or static tables.
//!
//! Run with: cargo test --test migration_engine_test -- --nocapture

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use tally_core::adapters::{DirectoryMigrations, DuckDbStore, EmbeddedMigrations};
use tally_core::domain::{LegacyVersionMap, CONSOLIDATED_VERSION};
use tally_core::ports::{Database, Value};
use tally_core::services::{MigrationRunner, StatementSplitter, VersionRegistry};
use tally_core::Error;

// ============================================================================
// Test Helpers
// ============================================================================

fn open_store(temp_dir: &TempDir) -> DuckDbStore {
    DuckDbStore::open(&temp_dir.path().join("tally.duckdb")).expect("Failed to open store")
}

fn write_migration(dir: &Path, name: &str, sql: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(name), sql).unwrap();
}

/// All metadata rows as (version, description), ordered by version
fn metadata_rows(store: &DuckDbStore) -> Vec<(i64, String)> {
    store
        .query(
            "SELECT version, description FROM schema_migrations ORDER BY version",
            &[],
        )
        .unwrap()
        .into_iter()
        .map(|row| {
            (
                row[0].as_i64().unwrap(),
                row[1].as_str().unwrap().to_string(),
            )
        })
        .collect()
}

// ============================================================================
// Ordering
// ============================================================================

/// Date-coded files are applied oldest first
#[test]
fn test_date_coded_files_apply_in_order() {
    let temp_dir = TempDir::new().unwrap();
    let sql_dir = temp_dir.path().join("sql");
    // Written newest first so directory order cannot be relied on
    write_migration(
        &sql_dir,
        "2025-12-07-001.sql",
        "INSERT INTO applied_order VALUES (20251207001);",
    );
    write_migration(
        &sql_dir,
        "2025-11-29-001.sql",
        "CREATE TABLE applied_order (version BIGINT);\nINSERT INTO applied_order VALUES (20251129001);",
    );

    let store = open_store(&temp_dir);
    let provider = DirectoryMigrations::new(&sql_dir);
    let report = MigrationRunner::new(&store, &provider, LegacyVersionMap::empty())
        .run()
        .unwrap();

    let versions: Vec<i64> = report.applied.iter().map(|m| m.version).collect();
    assert_eq!(versions, vec![20251129001, 20251207001]);

    let order = store
        .query("SELECT version FROM applied_order ORDER BY rowid", &[])
        .unwrap();
    assert_eq!(
        order,
        vec![
            vec![Value::Integer(20251129001)],
            vec![Value::Integer(20251207001)]
        ]
    );
}

// ============================================================================
// Fresh store and idempotence
// ============================================================================

/// A fresh store gets one row and the table the migration creates
#[test]
fn test_fresh_store_creates_table_and_row() {
    let temp_dir = TempDir::new().unwrap();
    let sql_dir = temp_dir.path().join("sql");
    write_migration(
        &sql_dir,
        "2025-12-07-001.sql",
        "CREATE TABLE budget_limits (id BIGINT PRIMARY KEY, limit_amount DECIMAL(12, 2));",
    );

    let store = open_store(&temp_dir);
    let provider = DirectoryMigrations::new(&sql_dir);
    MigrationRunner::new(&store, &provider, LegacyVersionMap::empty())
        .run()
        .unwrap();

    assert_eq!(
        metadata_rows(&store),
        vec![(20251207001, "2025-12-07-001".to_string())]
    );
    assert!(store.table_exists("budget_limits").unwrap());
}

/// Running twice leaves the metadata table unchanged
#[test]
fn test_second_run_is_noop() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("tally.duckdb");
    let provider = EmbeddedMigrations::store();

    let first_rows = {
        let store = DuckDbStore::open(&db_path).unwrap();
        let report = store
            .run_migrations(&provider, LegacyVersionMap::builtin())
            .unwrap();
        assert_eq!(report.applied.len(), provider.len());
        store
            .query(
                "SELECT version, description, applied_at::VARCHAR FROM schema_migrations ORDER BY version",
                &[],
            )
            .unwrap()
    };

    // Reopen so nothing is carried over in memory between runs
    let store = DuckDbStore::open(&db_path).unwrap();
    let report = store
        .run_migrations(&provider, LegacyVersionMap::builtin())
        .unwrap();
    assert!(report.is_noop());
    assert_eq!(report.already_applied, provider.len());

    let second_rows = store
        .query(
            "SELECT version, description, applied_at::VARCHAR FROM schema_migrations ORDER BY version",
            &[],
        )
        .unwrap();
    assert_eq!(first_rows, second_rows);
}

/// The packaged schema seeds categories whose text contains semicolons
#[test]
fn test_packaged_schema_keeps_quoted_semicolons() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir);
    store
        .run_migrations(&EmbeddedMigrations::store(), LegacyVersionMap::builtin())
        .unwrap();

    let rows = store
        .query(
            "SELECT description FROM categories WHERE name = ?",
            &[Value::from("Groceries")],
        )
        .unwrap();
    assert_eq!(rows, vec![vec![Value::from("Food; household supplies")]]);

    for table in ["budgets", "categories", "expenses", "budget_limits"] {
        assert!(store.table_exists(table).unwrap(), "{} should exist", table);
    }
}

// ============================================================================
// Legacy compatibility
// ============================================================================

/// Legacy rows 1-3 satisfy the consolidated migration
#[test]
fn test_legacy_rows_satisfy_consolidated_migration() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir);
    let legacy = LegacyVersionMap::builtin();

    // A store from before the consolidation: the tables exist already,
    // recorded under the old sequential versions.
    {
        let registry = VersionRegistry::new(&store, &legacy);
        registry.ensure_metadata_table().unwrap();
        for (version, name) in [(1, "001_budgets"), (2, "002_expenses"), (3, "003_categories")] {
            registry.record_applied(version, name).unwrap();
        }
    }

    const SET: &[(&str, &str)] = &[(
        "2025-11-29-001.sql",
        "CREATE TABLE consolidated_marker (id BIGINT);",
    )];
    let provider = EmbeddedMigrations::new("consolidated", SET);
    let report = MigrationRunner::new(&store, &provider, legacy)
        .run()
        .unwrap();

    assert!(report.is_noop());
    assert_eq!(report.satisfied_by_legacy, vec![CONSOLIDATED_VERSION]);

    let versions: Vec<i64> = metadata_rows(&store).into_iter().map(|(v, _)| v).collect();
    assert_eq!(versions, vec![1, 2, 3]);
    assert!(!store.table_exists("consolidated_marker").unwrap());
}

/// Without a legacy map the same store runs the migration
#[test]
fn test_empty_legacy_map_runs_consolidated_migration() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir);
    let none = LegacyVersionMap::empty();
    {
        let registry = VersionRegistry::new(&store, &none);
        registry.ensure_metadata_table().unwrap();
        registry.record_applied(1, "001_budgets").unwrap();
    }

    const SET: &[(&str, &str)] = &[(
        "2025-11-29-001.sql",
        "CREATE TABLE consolidated_marker (id BIGINT);",
    )];
    let provider = EmbeddedMigrations::new("consolidated", SET);
    let report = MigrationRunner::new(&store, &provider, none).run().unwrap();

    assert_eq!(report.applied.len(), 1);
    assert!(store.table_exists("consolidated_marker").unwrap());
}

// ============================================================================
// Failure atomicity
// ============================================================================

/// A constraint violation rolls back the whole file only
#[test]
fn test_constraint_violation_rolls_back_that_migration() {
    let temp_dir = TempDir::new().unwrap();
    let sql_dir = temp_dir.path().join("sql");
    write_migration(
        &sql_dir,
        "2025-11-29-001.sql",
        "CREATE TABLE budgets (id BIGINT PRIMARY KEY, name VARCHAR NOT NULL);
         INSERT INTO budgets VALUES (1, 'Household');",
    );
    write_migration(
        &sql_dir,
        "2025-12-07-001.sql",
        "CREATE TABLE budget_limits (id BIGINT PRIMARY KEY);
         INSERT INTO budget_limits VALUES (1);
         INSERT INTO budgets VALUES (2, NULL);",
    );

    let store = open_store(&temp_dir);
    let provider = DirectoryMigrations::new(&sql_dir);
    let runner = MigrationRunner::new(&store, &provider, LegacyVersionMap::empty());

    let err = runner.run().unwrap_err();
    match &err {
        Error::StatementExecution {
            version,
            description,
            index,
            ..
        } => {
            assert_eq!(*version, 20251207001);
            assert_eq!(description, "2025-12-07-001");
            assert_eq!(*index, 3);
        }
        other => panic!("expected StatementExecution, got {:?}", other),
    }

    assert_eq!(
        metadata_rows(&store),
        vec![(20251129001, "2025-11-29-001".to_string())]
    );
    assert!(!store.table_exists("budget_limits").unwrap());
    let budgets = store.query("SELECT COUNT(*) FROM budgets", &[]).unwrap();
    assert_eq!(budgets, vec![vec![Value::Integer(1)]]);

    // After the file is fixed the next run picks up where this one stopped
    write_migration(
        &sql_dir,
        "2025-12-07-001.sql",
        "CREATE TABLE budget_limits (id BIGINT PRIMARY KEY);
         INSERT INTO budget_limits VALUES (1);",
    );
    let report = runner.run().unwrap();
    assert_eq!(report.applied.len(), 1);
    assert_eq!(report.already_applied, 1);
    assert!(store.table_exists("budget_limits").unwrap());
}

/// A malformed filename anywhere in the set stops the run before any write
#[test]
fn test_bad_filename_blocks_whole_run() {
    let temp_dir = TempDir::new().unwrap();
    let sql_dir = temp_dir.path().join("sql");
    write_migration(&sql_dir, "2025-11-29-001.sql", "CREATE TABLE budgets (id BIGINT);");
    write_migration(&sql_dir, "2025-12-07-limits.sql", "CREATE TABLE budget_limits (id BIGINT);");

    let store = open_store(&temp_dir);
    let provider = DirectoryMigrations::new(&sql_dir);
    let err = MigrationRunner::new(&store, &provider, LegacyVersionMap::empty())
        .run()
        .unwrap_err();

    assert!(matches!(err, Error::FilenameParse { .. }));
    assert!(!store.table_exists("schema_migrations").unwrap());
    assert!(!store.table_exists("budgets").unwrap());
}

/// An unreadable migration directory is reported before any write
#[test]
fn test_missing_directory_blocks_run() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir);
    let provider = DirectoryMigrations::new(temp_dir.path().join("does-not-exist"));

    let err = MigrationRunner::new(&store, &provider, LegacyVersionMap::empty())
        .run()
        .unwrap_err();

    assert!(matches!(err, Error::DirectoryRead { .. }));
    assert!(!store.table_exists("schema_migrations").unwrap());
}

// ============================================================================
// Splitter
// ============================================================================

/// Quoted semicolons do not split statements
#[test]
fn test_quoted_semicolons_stay_in_statement() {
    assert_eq!(
        StatementSplitter::split("INSERT INTO t VALUES ('a;b'); SELECT 1;"),
        vec!["INSERT INTO t VALUES ('a;b')", "SELECT 1"]
    );
}

/// A statement the splitter produced runs as-is on the store
#[test]
fn test_split_statements_execute() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir);

    let sql = "CREATE TABLE notes (body VARCHAR);
               INSERT INTO notes VALUES ('first; second');
               INSERT INTO notes VALUES ('third')";
    for statement in StatementSplitter::split(sql) {
        store.exec(&statement, &[]).unwrap();
    }

    let rows = store
        .query("SELECT body FROM notes ORDER BY body", &[])
        .unwrap();
    assert_eq!(
        rows,
        vec![vec![Value::from("first; second")], vec![Value::from("third")]]
    );
}
