//! CLI command implementations

pub mod logs;
pub mod migrate;
pub mod split;
pub mod status;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tally_core::{LogEvent, LoggingService, TallyContext};

/// Open the migration history log
pub fn open_log() -> Result<LoggingService> {
    let data_dir = get_data_dir()?;
    std::fs::create_dir_all(&data_dir)?;
    LoggingService::new(&data_dir, env!("CARGO_PKG_VERSION"))
}

/// The history log, or None when it cannot be opened; a broken log never
/// blocks a migration
pub fn get_logger() -> Option<LoggingService> {
    match open_log() {
        Ok(service) => Some(service),
        Err(e) => {
            tracing::debug!("Event log unavailable: {:#}", e);
            None
        }
    }
}

/// Record an event if the log is available
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        if let Err(e) = l.log(event) {
            tracing::debug!("Failed to write event log: {:#}", e);
        }
    }
}

/// Get the data directory from environment or default
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("TALLY_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".tally"))
        .context("Could not find home directory; set TALLY_DIR")
}

/// Open the store without migrating it
pub fn open_context() -> Result<TallyContext> {
    let data_dir = get_data_dir()?;

    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

    TallyContext::open(&data_dir).context("Failed to open tally store")
}
