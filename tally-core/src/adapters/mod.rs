//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for the Database port
//! - Compiled-in SQL and directories on disk for MigrationFileProvider
//! - A file lock for cross-process exclusion during bootstrap

pub mod directory;
pub mod duckdb;
pub mod embedded;
pub mod lock;

pub use self::directory::DirectoryMigrations;
pub use self::duckdb::DuckDbStore;
pub use self::embedded::EmbeddedMigrations;
pub use self::lock::MigrationLock;
