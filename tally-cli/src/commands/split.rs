//! Split command - show how a migration file breaks into statements

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use tally_core::domain::parse_version;
use tally_core::services::StatementSplitter;

use crate::output;

pub fn run(file: &Path, json: bool) -> Result<()> {
    let sql = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let statements = StatementSplitter::split(&sql);

    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let version = parse_version(&filename);

    if json {
        return output::print_json(&serde_json::json!({
            "file": filename,
            "version": version.as_ref().ok(),
            "version_error": version.as_ref().err().map(|e| e.to_string()),
            "statements": statements,
        }));
    }

    match &version {
        Ok(v) => println!("{} {}", "Version:".bold(), v),
        Err(e) => println!("{} {}", "Version:".bold(), e.to_string().red()),
    }
    println!("{} {}", "Statements:".bold(), statements.len());

    for (i, statement) in statements.iter().enumerate() {
        println!();
        println!("{}", format!("-- [{}]", i + 1).dimmed());
        println!("{};", statement);
    }

    Ok(())
}
