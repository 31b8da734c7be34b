//! Migration sets compiled into the binary

use crate::domain::result::Result;
use crate::domain::MigrationFile;
use crate::ports::MigrationFileProvider;

/// Provider over a static `(filename, sql)` table built with `include_str!`
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedMigrations {
    name: &'static str,
    files: &'static [(&'static str, &'static str)],
}

impl EmbeddedMigrations {
    pub const fn new(name: &'static str, files: &'static [(&'static str, &'static str)]) -> Self {
        Self { name, files }
    }

    /// The store schema shipped with this build
    pub const fn store() -> Self {
        Self::new("store", crate::migrations::MIGRATIONS)
    }

    /// The event log schema shipped with this build
    pub const fn event_log() -> Self {
        Self::new("event-log", crate::log_migrations::LOG_MIGRATIONS)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl MigrationFileProvider for EmbeddedMigrations {
    fn origin(&self) -> String {
        format!("embedded:{}", self.name)
    }

    fn files(&self) -> Result<Vec<MigrationFile>> {
        Ok(self
            .files
            .iter()
            .map(|(name, sql)| MigrationFile::new(*name, *sql))
            .collect())
    }
}
