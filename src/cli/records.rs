//! CLI commands that act on a single record.
//!
//! # Usage
//!
//! ```bash
//! egresados add --matricula 20231234 --nombre "Ana Pérez" --estatus Titulado
//! egresados update 20231234 --nombre "Ana Pérez López" --generacion 2019-2023
//! egresados get 20231234
//! egresados delete 20231234
//! ```

use crate::models::{Graduate, GraduateFields};
use crate::storage::{ConnectionProvider, GraduateRepository};
use clap::Args;
use std::io::Write;

/// Non-key record fields as command-line options.
#[derive(Debug, Clone, Default, Args)]
pub struct RecordArgs {
    /// Full name.
    #[arg(long = "nombre")]
    pub nombre_completo: String,

    /// Career / program.
    #[arg(long)]
    pub carrera: Option<String>,

    /// Cohort label, e.g. 2019-2023.
    #[arg(long)]
    pub generacion: Option<String>,

    /// Egresado, En seguimiento or Titulado.
    #[arg(long)]
    pub estatus: Option<String>,

    /// Postal address.
    #[arg(long)]
    pub domicilio: Option<String>,

    /// Gender.
    #[arg(long)]
    pub genero: Option<String>,

    /// Phone number.
    #[arg(long)]
    pub telefono: Option<String>,

    /// E-mail address.
    #[arg(long = "correo")]
    pub correo_electronico: Option<String>,
}

impl From<RecordArgs> for GraduateFields {
    fn from(args: RecordArgs) -> Self {
        Self {
            nombre_completo: args.nombre_completo,
            carrera: args.carrera,
            generacion: args.generacion,
            estatus: args.estatus,
            domicilio: args.domicilio,
            genero: args.genero,
            telefono: args.telefono,
            correo_electronico: args.correo_electronico,
        }
    }
}

/// Executes the add command.
///
/// # Errors
///
/// Returns the engine's error when a constraint rejects the record.
pub fn cmd_add<W: Write>(
    provider: &ConnectionProvider,
    matricula: String,
    record: RecordArgs,
    writer: &mut W,
) -> Result<(), Box<dyn std::error::Error>> {
    let graduate = Graduate::from_parts(matricula, record.into());
    provider.unit_of_work(|scope| GraduateRepository::new(scope).add(&graduate))?;
    writeln!(writer, "Egresado {} registrado", graduate.matricula)?;
    Ok(())
}

/// Executes the update command.
///
/// An unknown `matricula` is reported but is not a failure.
///
/// # Errors
///
/// Returns the engine's error when a constraint rejects the new values.
pub fn cmd_update<W: Write>(
    provider: &ConnectionProvider,
    matricula: &str,
    record: RecordArgs,
    writer: &mut W,
) -> Result<(), Box<dyn std::error::Error>> {
    let fields: GraduateFields = record.into();
    let changed =
        provider.unit_of_work(|scope| GraduateRepository::new(scope).update(matricula, &fields))?;

    if changed == 0 {
        writeln!(writer, "Sin cambios: no existe la matrícula {matricula}")?;
    } else {
        writeln!(writer, "Egresado {matricula} actualizado")?;
    }
    Ok(())
}

/// Executes the get command, printing the record as JSON.
///
/// Returns `false` when no record has that key.
///
/// # Errors
///
/// Returns an error if storage access or output fails.
pub fn cmd_get<W: Write>(
    provider: &ConnectionProvider,
    matricula: &str,
    writer: &mut W,
) -> Result<bool, Box<dyn std::error::Error>> {
    let found = provider.unit_of_work(|scope| GraduateRepository::new(scope).get(matricula))?;

    match found {
        Some(graduate) => {
            writeln!(writer, "{}", serde_json::to_string_pretty(&graduate)?)?;
            Ok(true)
        },
        None => {
            writeln!(writer, "No se encontró la matrícula {matricula}")?;
            Ok(false)
        },
    }
}

/// Executes the delete command. Deleting an unknown key is not a failure.
///
/// # Errors
///
/// Returns an error if storage access or output fails.
pub fn cmd_delete<W: Write>(
    provider: &ConnectionProvider,
    matricula: &str,
    writer: &mut W,
) -> Result<(), Box<dyn std::error::Error>> {
    let removed =
        provider.unit_of_work(|scope| GraduateRepository::new(scope).delete(matricula))?;

    if removed == 0 {
        writeln!(writer, "No existe la matrícula {matricula}")?;
    } else {
        writeln!(writer, "Egresado {matricula} eliminado")?;
    }
    Ok(())
}
