//! Migration file provider port
//!
//! Defines where migration files come from: SQL packaged into the binary,
//! a directory on disk, or a synthetic set built by a test.

use crate::domain::result::Result;
use crate::domain::MigrationFile;

/// Source of raw `(name, contents)` migration files
///
/// Implementations only enumerate and read; they never write to the set.
/// The order files come back in carries no meaning.
pub trait MigrationFileProvider {
    /// Human-readable origin used in diagnostics (e.g., "embedded", a path)
    fn origin(&self) -> String;

    /// Enumerate every migration file in the set
    fn files(&self) -> Result<Vec<MigrationFile>>;
}
