//! Graduate record repository.
//!
//! Each operation is one statement through the executor on the caller's
//! unit-of-work scope. Nothing here validates field shapes; the table's
//! constraints decide, and their errors reach the caller untouched.

use super::executor::Fetch;
use super::row::{Row, Value};
use super::scoped::ScopedConnection;
use super::sql::contains_pattern;
use crate::Result;
use crate::models::{CareerCount, CareerSummary, Graduate, GraduateFields};
use tracing::{debug, instrument};

const COLUMNS: &str = "matricula, nombre_completo, carrera, generacion, estatus, domicilio, \
                       genero, telefono, correo_electronico";

const INSERT_SQL: &str = "INSERT INTO egresados (matricula, nombre_completo, carrera, generacion, \
                          estatus, domicilio, genero, telefono, correo_electronico) \
                          VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)";

const UPDATE_SQL: &str = "UPDATE egresados SET nombre_completo = ?, carrera = ?, generacion = ?, \
                          estatus = ?, domicilio = ?, genero = ?, telefono = ?, \
                          correo_electronico = ? WHERE matricula = ?";

const DELETE_SQL: &str = "DELETE FROM egresados WHERE matricula = ?";

const COUNT_BY_CAREER_SQL: &str =
    "SELECT carrera, COUNT(*) AS cnt FROM egresados GROUP BY carrera ORDER BY carrera";

/// Record operations on the `egresados` table.
///
/// Borrows the unit of work's scope; the first call opens its connection.
pub struct GraduateRepository<'s, 'p> {
    scope: &'s mut ScopedConnection<'p>,
}

impl<'s, 'p> GraduateRepository<'s, 'p> {
    /// Creates a repository bound to a unit-of-work scope.
    pub const fn new(scope: &'s mut ScopedConnection<'p>) -> Self {
        Self { scope }
    }

    /// Inserts a record and commits.
    ///
    /// # Errors
    ///
    /// Fails with a constraint violation if the key already exists, is not
    /// exactly eight digits, or `estatus` is outside the allowed values.
    #[instrument(skip(self, graduate), fields(matricula = %graduate.matricula))]
    pub fn add(&mut self, graduate: &Graduate) -> Result<()> {
        let params = [
            Value::from(graduate.matricula.as_str()),
            Value::from(graduate.nombre_completo.as_str()),
            Value::from(&graduate.carrera),
            Value::from(&graduate.generacion),
            Value::from(&graduate.estatus),
            Value::from(&graduate.domicilio),
            Value::from(&graduate.genero),
            Value::from(&graduate.telefono),
            Value::from(&graduate.correo_electronico),
        ];
        self.scope.execute(INSERT_SQL, &params, Fetch::None, true)?;
        debug!("graduate added");
        Ok(())
    }

    /// Rewrites every field except the key and commits.
    ///
    /// An unknown key is not an error: nothing is updated and nothing is
    /// created. Returns the number of rows changed (0 or 1).
    ///
    /// # Errors
    ///
    /// Fails with a constraint violation if `estatus` is invalid or the name
    /// is missing.
    #[instrument(skip(self, fields))]
    pub fn update(&mut self, matricula: &str, fields: &GraduateFields) -> Result<u64> {
        let params = [
            Value::from(fields.nombre_completo.as_str()),
            Value::from(&fields.carrera),
            Value::from(&fields.generacion),
            Value::from(&fields.estatus),
            Value::from(&fields.domicilio),
            Value::from(&fields.genero),
            Value::from(&fields.telefono),
            Value::from(&fields.correo_electronico),
            Value::from(matricula),
        ];
        let result = self.scope.execute(UPDATE_SQL, &params, Fetch::None, true)?;
        let changed = result.rows_affected().unwrap_or_default();
        debug!(changed, "graduate updated");
        Ok(changed)
    }

    /// Fetches one record by key; `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns the engine's error.
    #[instrument(skip(self))]
    pub fn get(&mut self, matricula: &str) -> Result<Option<Graduate>> {
        let sql = format!("SELECT {COLUMNS} FROM egresados WHERE matricula = ?");
        let row = self
            .scope
            .execute(&sql, &[Value::from(matricula)], Fetch::One, false)?
            .into_one();
        Ok(row.as_ref().map(graduate_from_row))
    }

    /// Deletes a record by key and commits. An unknown key is a no-op.
    ///
    /// Returns the number of rows removed (0 or 1).
    ///
    /// # Errors
    ///
    /// Returns the engine's error.
    #[instrument(skip(self))]
    pub fn delete(&mut self, matricula: &str) -> Result<u64> {
        let result = self
            .scope
            .execute(DELETE_SQL, &[Value::from(matricula)], Fetch::None, true)?;
        Ok(result.rows_affected().unwrap_or_default())
    }

    /// Lists every record ordered by full name ascending.
    ///
    /// Collation is the engine's: `SQLite` compares bytes (`BINARY`),
    /// PostgreSQL uses the database locale.
    ///
    /// # Errors
    ///
    /// Returns the engine's error.
    #[instrument(skip(self))]
    pub fn list_all(&mut self) -> Result<Vec<Graduate>> {
        let sql = format!("SELECT {COLUMNS} FROM egresados ORDER BY nombre_completo");
        let rows = self.scope.execute(&sql, &[], Fetch::All, false)?.into_all();
        Ok(rows.iter().map(graduate_from_row).collect())
    }

    /// Finds records whose key, name, career, or e-mail contains `query`.
    ///
    /// Ordered by full name. A blank query returns the whole roster. Case
    /// sensitivity follows the engine's `LIKE` (`SQLite` folds ASCII case,
    /// PostgreSQL does not).
    ///
    /// # Errors
    ///
    /// Returns the engine's error.
    #[instrument(skip(self))]
    pub fn search(&mut self, query: &str) -> Result<Vec<Graduate>> {
        let term = query.trim();
        if term.is_empty() {
            return self.list_all();
        }

        let sql = format!(
            "SELECT {COLUMNS} FROM egresados \
             WHERE matricula LIKE ? ESCAPE '\\' OR nombre_completo LIKE ? ESCAPE '\\' \
             OR carrera LIKE ? ESCAPE '\\' OR correo_electronico LIKE ? ESCAPE '\\' \
             ORDER BY nombre_completo"
        );
        let pattern = Value::from(contains_pattern(term));
        let params = [pattern.clone(), pattern.clone(), pattern.clone(), pattern];
        let rows = self.scope.execute(&sql, &params, Fetch::All, false)?.into_all();
        Ok(rows.iter().map(graduate_from_row).collect())
    }

    /// Counts records per `carrera` value, absent careers grouped as `None`.
    ///
    /// # Errors
    ///
    /// Returns the engine's error.
    #[instrument(skip(self))]
    pub fn count_by_career(&mut self) -> Result<Vec<CareerCount>> {
        let rows = self
            .scope
            .execute(COUNT_BY_CAREER_SQL, &[], Fetch::All, false)?
            .into_all();
        Ok(rows
            .iter()
            .map(|row| CareerCount {
                carrera: row.text("carrera"),
                count: row
                    .integer("cnt")
                    .and_then(|n| u64::try_from(n).ok())
                    .unwrap_or_default(),
            })
            .collect())
    }

    /// Per-career counts folded into the dashboard layout.
    ///
    /// # Errors
    ///
    /// Returns the engine's error.
    pub fn career_summary(&mut self) -> Result<CareerSummary> {
        Ok(CareerSummary::from_counts(&self.count_by_career()?))
    }
}

/// Maps a row selected with [`COLUMNS`] to a [`Graduate`].
fn graduate_from_row(row: &Row) -> Graduate {
    Graduate {
        matricula: row.text("matricula").unwrap_or_default(),
        nombre_completo: row.text("nombre_completo").unwrap_or_default(),
        carrera: row.text("carrera"),
        generacion: row.text("generacion"),
        estatus: row.text("estatus"),
        domicilio: row.text("domicilio"),
        genero: row.text("genero"),
        telefono: row.text("telefono"),
        correo_electronico: row.text("correo_electronico"),
    }
}
