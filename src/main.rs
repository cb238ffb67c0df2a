//! Binary entry point for egresados.
//!
//! Administrative command line over the graduate roster.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// The binary reports to the terminal directly.
#![allow(clippy::print_stderr, clippy::print_stdout)]
#![allow(clippy::needless_pass_by_value)]
// rusqlite and tokio-postgres pull in duplicate transitive versions.
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use egresados::cli::{self, OutputFormat, RecordArgs};
use egresados::config::StorageConfig;
use egresados::observability::{self, LoggingConfig};
use egresados::storage::{ConnectionProvider, ensure_schema};
use std::io;
use std::path::Path;
use std::process::ExitCode;

/// Egresados - graduate roster administration.
#[derive(Parser)]
#[command(name = "egresados")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "EGRESADOS_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Create the egresados table if it does not exist.
    InitDb,

    /// Register a graduate.
    Add {
        /// Enrollment number (8 digits).
        #[arg(long)]
        matricula: String,

        #[command(flatten)]
        record: RecordArgs,
    },

    /// Rewrite every field of a graduate except the enrollment number.
    Update {
        /// Enrollment number of the record to update.
        matricula: String,

        #[command(flatten)]
        record: RecordArgs,
    },

    /// Print a graduate as JSON.
    Get {
        /// Enrollment number.
        matricula: String,
    },

    /// Remove a graduate.
    Delete {
        /// Enrollment number.
        matricula: String,
    },

    /// List the roster, optionally filtered.
    List {
        /// Substring to match against enrollment number, name, career or e-mail.
        #[arg(short, long)]
        query: Option<String>,

        /// Output format (table, json).
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show graduates per career.
    Stats {
        /// Output format (table, json).
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init(LoggingConfig::from_env(cli.verbose)) {
        eprintln!("Could not set up logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli.command, config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Opens the provider, ensures the schema, and runs one command.
fn run_command(
    command: Commands,
    config: StorageConfig,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let provider = ConnectionProvider::new(config)?;
    ensure_schema(&provider)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::InitDb => cli::cmd_init_db(&provider, &mut out)?,
        Commands::Add { matricula, record } => {
            cli::cmd_add(&provider, matricula, record, &mut out)?;
        },
        Commands::Update { matricula, record } => {
            cli::cmd_update(&provider, &matricula, record, &mut out)?;
        },
        Commands::Get { matricula } => {
            if !cli::cmd_get(&provider, &matricula, &mut out)? {
                return Ok(ExitCode::FAILURE);
            }
        },
        Commands::Delete { matricula } => cli::cmd_delete(&provider, &matricula, &mut out)?,
        Commands::List { query, format } => {
            cli::cmd_list(&provider, query.as_deref(), format, &mut out)?;
        },
        Commands::Stats { format } => cli::cmd_stats(&provider, format, &mut out)?,
    }

    Ok(ExitCode::SUCCESS)
}

/// Reads the file given with `--config`, or the default locations.
fn load_config(path: Option<&str>) -> Result<StorageConfig, Box<dyn std::error::Error>> {
    if let Some(config_path) = path {
        return StorageConfig::load_from_file(Path::new(config_path)).map_err(Into::into);
    }

    StorageConfig::load_default().map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_flag_parses_through_output_format() {
        let cli = Cli::try_parse_from(["egresados", "list", "--format", "json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::List {
                format: OutputFormat::Json,
                ..
            }
        ));

        let cli = Cli::try_parse_from(["egresados", "stats"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Stats {
                format: OutputFormat::Table
            }
        ));

        assert!(Cli::try_parse_from(["egresados", "list", "--format", "csv"]).is_err());
    }
}
