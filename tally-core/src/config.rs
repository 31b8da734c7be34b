//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "database": { "file": "tally.duckdb" },
//!   "migrations": {
//!     "directory": "/opt/tally/migrations",
//!     "legacyVersions": { "1": 20251129001, "2": 20251129001, "3": 20251129001 }
//!   }
//! }
//! ```
//! The file is read-only to this crate; sections it does not know about
//! (server settings and the like) are ignored.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::adapters::{DirectoryMigrations, EmbeddedMigrations};
use crate::domain::result::{Error, Result};
use crate::domain::LegacyVersionMap;
use crate::ports::MigrationFileProvider;

/// Settings file name inside the data directory
pub const SETTINGS_FILE: &str = "settings.json";

/// Default store file name
pub const DEFAULT_DB_FILE: &str = "tally.duckdb";

/// Environment variable overriding the migrations directory
pub const MIGRATIONS_DIR_ENV: &str = "TALLY_MIGRATIONS_DIR";

/// Raw settings.json structure
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    database: DatabaseSettings,
    #[serde(default)]
    migrations: MigrationSettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatabaseSettings {
    #[serde(default)]
    file: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MigrationSettings {
    #[serde(default)]
    directory: Option<PathBuf>,
    #[serde(default)]
    legacy_versions: Option<LegacyVersionMap>,
}

/// Where migrations are loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationSourceConfig {
    /// The set compiled into the binary
    Embedded,
    /// `*.sql` files in a directory
    Directory(PathBuf),
}

impl MigrationSourceConfig {
    /// Build the provider this configuration names
    pub fn provider(&self) -> Box<dyn MigrationFileProvider> {
        match self {
            MigrationSourceConfig::Embedded => Box::new(EmbeddedMigrations::store()),
            MigrationSourceConfig::Directory(dir) => Box::new(DirectoryMigrations::new(dir)),
        }
    }
}

/// Tally configuration (simplified view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    pub db_file: String,
    pub migration_source: MigrationSourceConfig,
    pub legacy_versions: LegacyVersionMap,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_file: DEFAULT_DB_FILE.to_string(),
            migration_source: MigrationSourceConfig::Embedded,
            legacy_versions: LegacyVersionMap::builtin(),
        }
    }
}

impl Config {
    /// Load config from the data directory
    ///
    /// The migrations directory can be overridden with TALLY_MIGRATIONS_DIR.
    /// A missing settings file yields the defaults; a malformed one is an
    /// error rather than being silently replaced.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let settings_path = data_dir.join(SETTINGS_FILE);

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).map_err(|e| {
                Error::Config(format!("{}: {}", settings_path.display(), e))
            })?
        } else {
            SettingsFile::default()
        };

        let directory = std::env::var_os(MIGRATIONS_DIR_ENV)
            .map(PathBuf::from)
            .or_else(|| raw.migrations.directory.clone());

        let migration_source = match directory {
            // Relative paths are relative to the data directory
            Some(dir) if dir.is_relative() => MigrationSourceConfig::Directory(data_dir.join(dir)),
            Some(dir) => MigrationSourceConfig::Directory(dir),
            None => MigrationSourceConfig::Embedded,
        };

        Ok(Self {
            db_file: raw
                .database
                .file
                .unwrap_or_else(|| DEFAULT_DB_FILE.to_string()),
            migration_source,
            legacy_versions: raw
                .migrations
                .legacy_versions
                .unwrap_or_else(LegacyVersionMap::builtin),
        })
    }

    /// Full path of the store file
    pub fn db_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.db_file)
    }
}
