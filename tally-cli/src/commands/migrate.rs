//! Migrate command - apply pending schema migrations

use anyhow::Result;
use colored::Colorize;

use super::{get_logger, log_event, open_context};
use crate::output;
use tally_core::{Error, LogEvent};

pub fn run(json: bool) -> Result<()> {
    let logger = get_logger();
    log_event(&logger, LogEvent::command("migrate"));

    let ctx = open_context()?;
    let report = match ctx.migrate() {
        Ok(report) => report,
        Err(e) => {
            let mut event = LogEvent::migration_failed(format!("{:#}", e));
            let mut untouched = false;
            if let Some(core) = e.downcast_ref::<Error>() {
                if let Some(version) = core.version() {
                    event = event.with_version(version);
                }
                if let Error::StatementExecution { statement, .. } = core {
                    event = event.with_error_details(statement.clone());
                }
                untouched = core.is_load_error();
            }
            log_event(&logger, event);
            if untouched {
                return Err(e.context("Migration files rejected; the store was not modified"));
            }
            return Err(e);
        }
    };

    for applied in &report.applied {
        log_event(&logger, LogEvent::migration_applied(applied.version));
    }

    if json {
        return output::print_json(&report);
    }

    if report.is_noop() {
        output::success(&format!(
            "Schema is up to date ({} migrations already applied)",
            report.already_applied
        ));
    } else {
        let mut table = output::table(&["Version", "Description", "Statements"]);
        for applied in &report.applied {
            table.add_row(vec![
                applied.version.to_string(),
                applied.description.clone(),
                applied.statements.to_string(),
            ]);
        }
        println!("{}", table);
        output::success(&format!("Applied {} migration(s)", report.applied.len()));
    }

    if !report.satisfied_by_legacy.is_empty() {
        println!(
            "{} {:?}",
            "Satisfied by legacy versions:".dimmed(),
            report.satisfied_by_legacy
        );
    }

    Ok(())
}
