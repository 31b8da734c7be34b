//! Status command - show which migrations are applied or pending

use anyhow::Result;
use colored::Colorize;
use comfy_table::{Cell, Color};
use tally_core::services::MigrationState;

use super::open_context;
use crate::output;

pub fn run(json: bool) -> Result<()> {
    let ctx = open_context()?;
    let status = ctx.migration_status()?;

    if json {
        return output::print_json(&status);
    }

    println!("{}", "Schema Migrations".bold());
    println!("Source: {}", status.origin);
    let legacy = &ctx.config.legacy_versions;
    if legacy.is_empty() {
        println!("Legacy map: none");
    } else {
        println!("Legacy map: {} version(s)", legacy.len());
    }
    println!();

    let mut table = output::table(&["Version", "Description", "State", "Applied At"]);

    for entry in &status.migrations {
        let (state, color, applied_at) = match &entry.state {
            MigrationState::Applied { applied_at } => (
                "applied".to_string(),
                Color::Green,
                applied_at
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default(),
            ),
            MigrationState::SatisfiedByLegacy { legacy_versions } => (
                format!("legacy {:?}", legacy_versions),
                Color::Cyan,
                String::new(),
            ),
            MigrationState::Pending => ("pending".to_string(), Color::Yellow, String::new()),
        };

        table.add_row(vec![
            Cell::new(entry.version),
            Cell::new(&entry.description),
            Cell::new(state).fg(color),
            Cell::new(applied_at),
        ]);
    }

    println!("{}", table);

    let pending = status.pending_count();
    if pending > 0 {
        output::warning(&format!("{} pending migration(s); run `tally migrate`", pending));
    } else {
        output::success("Schema is up to date");
    }

    if !status.unknown.is_empty() {
        output::info(&format!(
            "Recorded versions without a migration file: {:?}",
            status.unknown
        ));
    }

    Ok(())
}
