//! Tally Core - embedded schema migration engine for the Tally budget store
//!
//! This crate follows hexagonal architecture:
//!
//! - **domain**: Migration values, version parsing, the legacy version map, errors
//! - **ports**: Trait definitions for external dependencies (Database, MigrationFileProvider)
//! - **services**: The engine (source, splitter, registry, runner) and the event log
//! - **adapters**: Concrete implementations (DuckDB, embedded SQL, directories, file lock)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use adapters::{DuckDbStore, MigrationLock};
use config::Config;
use ports::MigrationFileProvider;
use services::{MigrationReport, MigrationRunner, MigrationStatus};

// Re-export commonly used types at crate root
pub use domain::result::Error;
pub use domain::{AppliedMigrationRecord, LegacyVersionMap, Migration};
pub use services::{HistoryFilter, LogEvent, LoggingService};

/// Main context for a process that owns a Tally store
///
/// Holds the configuration, the open store and the migration lock. The
/// lock is held for as long as the context lives.
pub struct TallyContext {
    pub config: Config,
    pub data_dir: PathBuf,
    pub store: Arc<DuckDbStore>,
    provider: Box<dyn MigrationFileProvider>,
    _lock: MigrationLock,
}

impl TallyContext {
    /// Open the store and bring its schema up to date
    ///
    /// This is the startup path: any migration failure is returned and the
    /// caller must not serve traffic against the store.
    pub fn new(data_dir: &Path) -> Result<Self> {
        let context = Self::open(data_dir)?;
        context.migrate()?;
        Ok(context)
    }

    /// Open the store without applying migrations
    pub fn open(data_dir: &Path) -> Result<Self> {
        let config = Config::load(data_dir)
            .with_context(|| format!("Failed to load settings from {}", data_dir.display()))?;
        let db_path = config.db_path(data_dir);

        let lock = MigrationLock::acquire(&db_path)?;
        let store = DuckDbStore::open(&db_path)
            .with_context(|| format!("Failed to open database {}", db_path.display()))?;
        let provider = config.migration_source.provider();

        Ok(Self {
            config,
            data_dir: data_dir.to_path_buf(),
            store: Arc::new(store),
            provider,
            _lock: lock,
        })
    }

    /// Migration runner wired to this context's store, provider and legacy map
    pub fn runner(&self) -> MigrationRunner<'_> {
        MigrationRunner::new(
            self.store.as_ref(),
            self.provider.as_ref(),
            self.config.legacy_versions.clone(),
        )
    }

    /// Apply every pending migration
    pub fn migrate(&self) -> Result<MigrationReport> {
        self.runner()
            .run()
            .with_context(|| format!("Migrations from {} failed", self.provider.origin()))
    }

    /// Report migration state without applying anything
    pub fn migration_status(&self) -> Result<MigrationStatus> {
        Ok(self.runner().status()?)
    }
}
