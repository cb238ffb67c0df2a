//! CLI commands for schema setup and roster statistics.

use super::OutputFormat;
use crate::models::CareerSummary;
use crate::storage::{ConnectionProvider, GraduateRepository, ensure_schema};
use std::io::{self, Write};

/// Executes the init-db command.
///
/// # Errors
///
/// Returns an error if the table cannot be created.
pub fn cmd_init_db<W: Write>(
    provider: &ConnectionProvider,
    writer: &mut W,
) -> Result<(), Box<dyn std::error::Error>> {
    ensure_schema(provider)?;
    writeln!(writer, "Esquema listo ({})", provider.engine())?;
    Ok(())
}

/// Writes a career summary as labelled counts with a total line.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_summary<W: Write>(writer: &mut W, summary: &CareerSummary) -> io::Result<()> {
    let width = summary
        .entries
        .iter()
        .map(|e| e.label.chars().count())
        .max()
        .unwrap_or(0)
        .max("Total".len());

    for entry in &summary.entries {
        writeln!(writer, "{:<width$}  {:>6}", entry.label, entry.count)?;
    }
    writeln!(writer, "{:<width$}  {:>6}", "Total", summary.total)
}

/// Executes the stats command.
///
/// # Errors
///
/// Returns an error if storage access or output fails.
pub fn cmd_stats<W: Write>(
    provider: &ConnectionProvider,
    format: OutputFormat,
    writer: &mut W,
) -> Result<(), Box<dyn std::error::Error>> {
    let summary =
        provider.unit_of_work(|scope| GraduateRepository::new(scope).career_summary())?;

    match format {
        OutputFormat::Json => writeln!(writer, "{}", serde_json::to_string_pretty(&summary)?)?,
        OutputFormat::Table => write_summary(writer, &summary)?,
    }
    Ok(())
}
