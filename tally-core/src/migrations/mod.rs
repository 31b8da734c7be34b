//! Database migrations - embedded SQL files
//!
//! Migrations are compiled into the binary at build time using include_str!.
//! Each migration is a tuple of (filename, sql_content). Filenames are
//! `YYYY-MM-DD-NNN.sql`; the version is the filename's digits, and
//! migrations are applied in ascending version order.

/// All migrations, embedded at compile time.
/// Format: (filename, sql_content)
///
/// IMPORTANT: When adding a new migration:
/// 1. Create the SQL file: YYYY-MM-DD-NNN.sql
/// 2. Add an entry here
/// Never edit a file that has shipped; add a new one instead.
pub const MIGRATIONS: &[(&str, &str)] = &[
    ("2025-11-29-001.sql", include_str!("2025-11-29-001.sql")),
    ("2025-12-07-001.sql", include_str!("2025-12-07-001.sql")),
];
