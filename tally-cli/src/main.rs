//! Tally CLI - manage the schema of a Tally budget store

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tally_core::HistoryFilter;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{logs, migrate, split, status};

/// Tally - budget store schema tooling
#[derive(Parser)]
#[command(name = "tally", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending schema migrations
    Migrate {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show applied and pending migrations
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the statements a migration file splits into
    Split {
        /// Path to the SQL file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the migration history recorded by earlier runs
    Logs {
        /// Only failed runs
        #[arg(long)]
        failed: bool,
        /// Only events for this migration version
        #[arg(long, value_name = "VERSION")]
        migration: Option<i64>,
        /// Number of entries to show
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TALLY_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Migrate { json } => migrate::run(json),
        Commands::Status { json } => status::run(json),
        Commands::Split { file, json } => split::run(&file, json),
        Commands::Logs {
            failed,
            migration,
            limit,
            json,
        } => logs::run(
            HistoryFilter {
                version: migration,
                failures_only: failed,
                limit,
            },
            json,
        ),
    }
}
