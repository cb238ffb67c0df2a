//! CLI command for listing and searching the roster.

use crate::models::Graduate;
use crate::storage::{ConnectionProvider, GraduateRepository};
use std::io::{self, Write};
use std::str::FromStr;

/// Output format for record listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned columns (default).
    #[default]
    Table,
    /// Pretty-printed JSON array.
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown format '{other}', expected 'table' or 'json'")),
        }
    }
}

const HEADERS: [&str; 5] = ["MATRICULA", "NOMBRE", "CARRERA", "GENERACION", "ESTATUS"];

fn table_cells(graduate: &Graduate) -> [&str; 5] {
    [
        graduate.matricula.as_str(),
        graduate.nombre_completo.as_str(),
        graduate.carrera.as_deref().unwrap_or("-"),
        graduate.generacion.as_deref().unwrap_or("-"),
        graduate.estatus.as_deref().unwrap_or("-"),
    ]
}

/// Writes records as an aligned table.
///
/// Column widths follow the widest cell, counted in characters.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_table<W: Write>(writer: &mut W, graduates: &[Graduate]) -> io::Result<()> {
    let mut widths = HEADERS.map(|h| h.chars().count());
    for graduate in graduates {
        for (width, cell) in widths.iter_mut().zip(table_cells(graduate)) {
            *width = (*width).max(cell.chars().count());
        }
    }

    write_row(writer, &HEADERS, &widths)?;
    for graduate in graduates {
        write_row(writer, &table_cells(graduate), &widths)?;
    }
    writeln!(writer, "{} registro(s)", graduates.len())
}

fn write_row<W: Write>(writer: &mut W, cells: &[&str; 5], widths: &[usize; 5]) -> io::Result<()> {
    let line = cells
        .iter()
        .zip(widths.iter().copied())
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(writer, "{}", line.trim_end())
}

/// Writes records as JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write>(
    writer: &mut W,
    graduates: &[Graduate],
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(graduates)?;
    writeln!(writer, "{json}")?;
    Ok(())
}

/// Executes the list command: the whole roster, or a search when `query`
/// is given.
///
/// # Errors
///
/// Returns an error if storage access or output fails.
pub fn cmd_list<W: Write>(
    provider: &ConnectionProvider,
    query: Option<&str>,
    format: OutputFormat,
    writer: &mut W,
) -> Result<(), Box<dyn std::error::Error>> {
    let graduates = provider.unit_of_work(|scope| {
        let mut repo = GraduateRepository::new(scope);
        match query {
            Some(q) => repo.search(q),
            None => repo.list_all(),
        }
    })?;

    match format {
        OutputFormat::Table => {
            write_table(writer, &graduates)?;
            Ok(())
        },
        OutputFormat::Json => write_json(writer, &graduates),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Graduate> {
        vec![
            Graduate::new("20231234", "Ana Pérez")
                .with_carrera("Ingeniería en Sistemas Computacionales")
                .with_estatus("Titulado"),
            Graduate::new("20230002", "Luis Gómez"),
        ]
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("json").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str("table").unwrap(), OutputFormat::Table);
        assert!(OutputFormat::from_str("csv").is_err());
    }

    #[test]
    fn test_write_table_aligns_columns() {
        let mut buffer = Vec::new();
        write_table(&mut buffer, &sample()).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert!(lines[0].starts_with("MATRICULA  NOMBRE"));
        assert!(lines[1].starts_with("20231234   Ana Pérez "));
        assert!(lines[2].contains("Luis Gómez"));
        assert!(lines[2].ends_with('-'));
        assert_eq!(lines[3], "2 registro(s)");

        let name_col = lines[0].find("NOMBRE").unwrap();
        let career_col = lines[0].find("CARRERA").unwrap();
        assert_eq!(
            lines[1].chars().skip(name_col).take(career_col - name_col).collect::<String>(),
            format!("{:<width$}", "Ana Pérez", width = career_col - name_col)
        );
    }

    #[test]
    fn test_write_table_empty() {
        let mut buffer = Vec::new();
        write_table(&mut buffer, &[]).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        assert!(output.contains("MATRICULA"));
        assert!(output.ends_with("0 registro(s)\n"));
    }

    #[test]
    fn test_write_json() {
        let mut buffer = Vec::new();
        write_json(&mut buffer, &sample()).unwrap();
        let parsed: Vec<Graduate> = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(parsed, sample());
    }
}
