//! Migration domain model

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};

/// Suffix every migration filename carries
pub const MIGRATION_SUFFIX: &str = ".sql";

/// Separator between the date parts of a migration filename
const VERSION_SEPARATOR: char = '-';

/// A raw migration file as handed over by a provider: (name, contents)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    pub name: String,
    pub contents: String,
}

impl MigrationFile {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

/// A single versioned unit of schema change
///
/// Built once at load time from a `MigrationFile` and never mutated.
/// Only `version` and `description` end up in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub version: i64,
    pub description: String,
    pub sql: String,
}

impl Migration {
    /// Parse a migration file, deriving version and description from its name
    pub fn from_file(file: &MigrationFile) -> Result<Self> {
        Ok(Self {
            version: parse_version(&file.name)?,
            description: description_from_filename(&file.name).to_string(),
            sql: file.contents.clone(),
        })
    }
}

/// A row of the metadata table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedMigrationRecord {
    pub version: i64,
    pub description: String,
    pub applied_at: Option<NaiveDateTime>,
}

/// Filename with its extension removed
pub fn description_from_filename(filename: &str) -> &str {
    filename.strip_suffix(MIGRATION_SUFFIX).unwrap_or(filename)
}

/// Derive the version integer from a `YYYY-MM-DD-NNN.sql` filename
///
/// All `-` separators are removed and the remaining digits are read as a
/// base-10 integer: `2025-11-29-001.sql` becomes `20251129001`.
pub fn parse_version(filename: &str) -> Result<i64> {
    let stem = description_from_filename(filename);
    let digits: String = stem.chars().filter(|c| *c != VERSION_SEPARATOR).collect();

    if digits.is_empty() {
        return Err(Error::filename(filename, "no version digits"));
    }
    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_digit()) {
        return Err(Error::filename(
            filename,
            format!("unexpected character '{}' in version", bad),
        ));
    }

    let version: i64 = digits
        .parse()
        .map_err(|e| Error::filename(filename, format!("version out of range: {}", e)))?;

    if version == 0 {
        return Err(Error::filename(filename, "version must be positive"));
    }

    Ok(version)
}
