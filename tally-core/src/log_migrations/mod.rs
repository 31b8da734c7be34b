//! Log database migrations - embedded SQL files
//!
//! Migrations are compiled into the binary at build time using include_str!.
//! Each migration is a tuple of (filename, sql_content); the runner orders
//! them by the version encoded in the filename.

/// All log migrations, embedded at compile time.
/// Format: (filename, sql_content)
///
/// IMPORTANT: When adding a new migration:
/// 1. Create the SQL file: YYYY-MM-DD-NNN.sql
/// 2. Add an entry here
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[(
    "2025-11-29-001.sql",
    include_str!("2025-11-29-001.sql"),
)];
