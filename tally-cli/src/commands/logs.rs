//! Logs command - migration history recorded by earlier runs

use anyhow::Result;
use colored::Colorize;
use comfy_table::{Cell, Color};
use tally_core::services::logging::MIGRATION_FAILED;
use tally_core::HistoryFilter;

use super::open_log;
use crate::output;

pub fn run(filter: HistoryFilter, json: bool) -> Result<()> {
    let entries = open_log()?.migration_history(&filter)?;

    if json {
        return output::print_json(&entries);
    }

    if entries.is_empty() {
        println!("No migration history recorded.");
        return Ok(());
    }

    let mut table = output::table(&["Time", "Version", "Result", "Error"]);
    for entry in &entries {
        let failed = entry.event == MIGRATION_FAILED;
        let result = if failed {
            Cell::new("failed").fg(Color::Red)
        } else {
            Cell::new("applied").fg(Color::Green)
        };
        table.add_row(vec![
            Cell::new(output::format_timestamp_ms(entry.timestamp)),
            Cell::new(entry.version.map(|v| v.to_string()).unwrap_or_default()),
            result,
            Cell::new(entry.error_message.as_deref().unwrap_or_default()),
        ]);
    }
    println!("{}", table);

    // The failing statement is too long for a table cell
    if let Some(latest) = entries.iter().find(|e| e.event == MIGRATION_FAILED) {
        if let Some(statement) = &latest.error_details {
            println!();
            println!("{}", "Latest failing statement:".red().bold());
            println!("{};", statement);
        }
    }

    Ok(())
}
