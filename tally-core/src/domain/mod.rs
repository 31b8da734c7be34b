//! Core domain entities
//!
//! Pure data structures and the rules that derive them - no I/O.

pub mod legacy;
pub mod migration;
pub mod result;

pub use legacy::{LegacyVersionMap, CONSOLIDATED_VERSION};
pub use migration::{
    description_from_filename, parse_version, AppliedMigrationRecord, Migration, MigrationFile,
};
