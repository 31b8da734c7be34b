//! Service layer - the migration engine and its supporting services
//!
//! The engine is split along its data flow: `source` loads files,
//! `splitter` breaks them into statements, `registry` tracks what the store
//! has applied and `migration` drives the run.

pub mod logging;
pub mod migration;
pub mod registry;
pub mod source;
pub mod splitter;

pub use logging::{HistoryFilter, LogEntry, LogEvent, LoggingService};
pub use migration::{
    AppliedMigration, MigrationReport, MigrationRunner, MigrationState, MigrationStatus,
    MigrationStatusEntry,
};
pub use registry::{VersionRegistry, METADATA_TABLE};
pub use source::MigrationSource;
pub use splitter::StatementSplitter;
