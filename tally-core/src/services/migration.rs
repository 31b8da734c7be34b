//! Migration service - applies pending schema migrations
//!
//! Migrations come from a `MigrationFileProvider` and are tracked in the
//! `schema_migrations` table so each version runs at most once. Every
//! migration runs in its own transaction: a failure rolls back that file
//! only and stops the run, leaving earlier migrations committed.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::result::{Error, Result};
use crate::domain::{LegacyVersionMap, Migration};
use crate::ports::{Database, MigrationFileProvider};
use crate::services::registry::VersionRegistry;
use crate::services::source::MigrationSource;
use crate::services::splitter::StatementSplitter;

/// A migration applied by a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedMigration {
    pub version: i64,
    pub description: String,
    pub statements: usize,
}

/// Result of running migrations
#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationReport {
    /// Newly applied migrations, in the order they ran
    pub applied: Vec<AppliedMigration>,
    /// Count of known migrations that were already applied
    pub already_applied: usize,
    /// Versions skipped because a recorded legacy version stands in for them
    pub satisfied_by_legacy: Vec<i64>,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Where a known migration stands against the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MigrationState {
    Applied { applied_at: Option<NaiveDateTime> },
    SatisfiedByLegacy { legacy_versions: Vec<i64> },
    Pending,
}

/// One line of a status listing
#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatusEntry {
    pub version: i64,
    pub description: String,
    #[serde(flatten)]
    pub state: MigrationState,
}

/// Status of every known migration, without applying anything
#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatus {
    pub origin: String,
    pub migrations: Vec<MigrationStatusEntry>,
    /// Recorded versions with no matching migration file (including legacy rows)
    pub unknown: Vec<i64>,
}

impl MigrationStatus {
    pub fn pending(&self) -> impl Iterator<Item = &MigrationStatusEntry> {
        self.migrations
            .iter()
            .filter(|m| m.state == MigrationState::Pending)
    }

    pub fn pending_count(&self) -> usize {
        self.pending().count()
    }
}

/// Applies pending migrations from a provider to a database
pub struct MigrationRunner<'a> {
    db: &'a dyn Database,
    provider: &'a dyn MigrationFileProvider,
    legacy: LegacyVersionMap,
}

impl<'a> MigrationRunner<'a> {
    /// Create a runner; `legacy` may be `LegacyVersionMap::empty()`
    pub fn new(
        db: &'a dyn Database,
        provider: &'a dyn MigrationFileProvider,
        legacy: LegacyVersionMap,
    ) -> Self {
        Self {
            db,
            provider,
            legacy,
        }
    }

    fn registry(&self) -> VersionRegistry<'_> {
        VersionRegistry::new(self.db, &self.legacy)
    }

    /// Run all pending migrations
    ///
    /// This is the main entry point. It:
    /// 1. Loads and parses every migration file (no database access yet)
    /// 2. Ensures the schema_migrations table exists
    /// 3. Computes the applied set, including legacy equivalents
    /// 4. Applies each pending migration in ascending order, one
    ///    transaction per migration
    pub fn run(&self) -> Result<MigrationReport> {
        let migrations = MigrationSource::new(self.provider).load_all()?;

        let registry = self.registry();
        registry.ensure_metadata_table()?;
        let applied = registry.effective_applied()?;
        let recorded = registry.applied_versions()?;

        let mut report = MigrationReport::default();
        for migration in &migrations {
            if recorded.contains(&migration.version) {
                report.already_applied += 1;
                continue;
            }
            if applied.contains(&migration.version) {
                tracing::debug!(
                    "Skipping migration {} ({}): satisfied by legacy versions {:?}",
                    migration.version,
                    migration.description,
                    self.legacy.legacy_sources(migration.version, &recorded)
                );
                report.already_applied += 1;
                report.satisfied_by_legacy.push(migration.version);
                continue;
            }

            let statements = self.apply(&registry, migration)?;
            report.applied.push(AppliedMigration {
                version: migration.version,
                description: migration.description.clone(),
                statements,
            });
        }

        if report.is_noop() {
            tracing::debug!("Schema up to date ({} migrations)", migrations.len());
        } else {
            tracing::info!(
                "Applied {} migration(s) from {}",
                report.applied.len(),
                self.provider.origin()
            );
        }

        Ok(report)
    }

    /// Apply one migration inside its own transaction
    ///
    /// Returns the number of statements executed.
    fn apply(&self, registry: &VersionRegistry<'_>, migration: &Migration) -> Result<usize> {
        let statements = StatementSplitter::split(&migration.sql);

        self.db.begin().map_err(|e| Error::Transaction {
            version: migration.version,
            message: format!("begin failed: {}", e),
        })?;

        if let Err(err) = self.execute_all(registry, migration, &statements) {
            self.rollback(migration);
            return Err(err);
        }

        if let Err(e) = self.db.commit() {
            self.rollback(migration);
            return Err(Error::Transaction {
                version: migration.version,
                message: format!("commit failed: {}", e),
            });
        }

        tracing::info!(
            "Applied migration {} ({}, {} statements)",
            migration.version,
            migration.description,
            statements.len()
        );
        Ok(statements.len())
    }

    fn execute_all(
        &self,
        registry: &VersionRegistry<'_>,
        migration: &Migration,
        statements: &[String],
    ) -> Result<()> {
        for (i, statement) in statements.iter().enumerate() {
            if let Err(e) = self.db.exec(statement, &[]) {
                tracing::error!(
                    "Migration {} failed at statement {}: {}",
                    migration.version,
                    i + 1,
                    e
                );
                return Err(Error::StatementExecution {
                    version: migration.version,
                    description: migration.description.clone(),
                    index: i + 1,
                    statement: statement.clone(),
                    message: e.to_string(),
                });
            }
        }
        registry.record_applied(migration.version, &migration.description)
    }

    fn rollback(&self, migration: &Migration) {
        // Must not mask the error that triggered the rollback
        if let Err(e) = self.db.rollback() {
            tracing::warn!("Rollback of migration {} failed: {}", migration.version, e);
        }
    }

    /// Report every known migration's state without applying anything
    pub fn status(&self) -> Result<MigrationStatus> {
        let migrations = MigrationSource::new(self.provider).load_all()?;

        let registry = self.registry();
        registry.ensure_metadata_table()?;
        let records = registry.records()?;
        let recorded: BTreeSet<i64> = records.iter().map(|r| r.version).collect();

        let entries = migrations
            .iter()
            .map(|m| {
                let state = if let Some(record) = records.iter().find(|r| r.version == m.version) {
                    MigrationState::Applied {
                        applied_at: record.applied_at,
                    }
                } else {
                    let sources = self.legacy.legacy_sources(m.version, &recorded);
                    if sources.is_empty() {
                        MigrationState::Pending
                    } else {
                        MigrationState::SatisfiedByLegacy {
                            legacy_versions: sources,
                        }
                    }
                };
                MigrationStatusEntry {
                    version: m.version,
                    description: m.description.clone(),
                    state,
                }
            })
            .collect();

        let known: BTreeSet<i64> = migrations.iter().map(|m| m.version).collect();
        let unknown = recorded.difference(&known).copied().collect();

        Ok(MigrationStatus {
            origin: self.provider.origin(),
            migrations: entries,
            unknown,
        })
    }

    /// Versions that a run would apply, ascending
    pub fn pending(&self) -> Result<Vec<i64>> {
        Ok(self.status()?.pending().map(|m| m.version).collect())
    }
}
