//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The migration
//! engine depends only on these traits, not on concrete implementations.

mod database;
mod migration_files;

pub use database::{Database, Row, Value};
pub use migration_files::MigrationFileProvider;
