//! Schema management for the `egresados` table.
//!
//! There is exactly one table and no migrations. Validation of `matricula`
//! and `estatus` lives in the `CHECK` constraints below, written in each
//! engine's own dialect.

use super::connection::ConnectionProvider;
use crate::Result;
use tracing::{info, instrument};

/// `SQLite` definition: `GLOB` character classes for the 8-digit key.
pub const SQLITE_DDL: &str = r"
CREATE TABLE IF NOT EXISTS egresados (
    matricula TEXT PRIMARY KEY CHECK (length(matricula) = 8 AND matricula GLOB '[0-9][0-9][0-9][0-9][0-9][0-9][0-9][0-9]'),
    nombre_completo TEXT NOT NULL,
    carrera TEXT,
    generacion TEXT,
    estatus TEXT CHECK (estatus IN ('Egresado', 'En seguimiento', 'Titulado')),
    domicilio TEXT,
    genero TEXT,
    telefono TEXT,
    correo_electronico TEXT
);
";

/// PostgreSQL definition: length plus POSIX regex for the 8-digit key.
pub const POSTGRES_DDL: &str = r"
CREATE TABLE IF NOT EXISTS egresados (
    matricula TEXT PRIMARY KEY CHECK (char_length(matricula) = 8 AND matricula ~ '^[0-9]{8}$'),
    nombre_completo TEXT NOT NULL,
    carrera TEXT,
    generacion TEXT,
    estatus TEXT CHECK (estatus IN ('Egresado', 'En seguimiento', 'Titulado')),
    domicilio TEXT,
    genero TEXT,
    telefono TEXT,
    correo_electronico TEXT
);
";

/// Creates the `egresados` table if it does not exist.
///
/// Idempotent: safe to run at every process start. Runs on its own
/// connection, opened and closed here, since it executes outside any unit
/// of work.
///
/// # Errors
///
/// Returns the connectivity or DDL error unchanged. Callers should treat it
/// as fatal to startup.
#[instrument(skip(provider), fields(engine = %provider.engine()))]
pub fn ensure_schema(provider: &ConnectionProvider) -> Result<()> {
    let mut conn = provider.open_connection()?;
    let created = conn.execute_batch(provider.engine().schema_ddl());
    let closed = conn.close();
    created?;
    closed?;
    info!("schema ready");
    Ok(())
}
