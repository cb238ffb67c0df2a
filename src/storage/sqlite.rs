//! Embedded engine connection.
//!
//! Wraps a `rusqlite::Connection` tuned for concurrent access from several
//! worker processes or threads, each holding its own connection.

use super::row::{Row, Value};
use crate::{Error, Result};
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{Connection, ToSql, params_from_iter};
use std::path::Path;
use std::time::Duration;

/// A single `SQLite` connection.
pub struct SqliteConnection {
    conn: Connection,
}

impl SqliteConnection {
    /// Opens the database file and applies [`configure_connection`].
    ///
    /// The parent directory is created when missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the database
    /// cannot be opened or configured.
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
                operation: "create_db_dir".to_string(),
                cause: format!("{}: {e}", parent.display()),
            })?;
        }

        let conn = Connection::open(path)?;
        configure_connection(&conn, busy_timeout)?;
        Ok(Self { conn })
    }

    /// Opens a private in-memory database with the same tuning.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or configured.
    pub fn open_in_memory(busy_timeout: Duration) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        configure_connection(&conn, busy_timeout)?;
        Ok(Self { conn })
    }

    /// Runs a statement and collects every row it produces.
    ///
    /// Parameters are bound positionally; a count mismatch is reported by
    /// `SQLite` as [`rusqlite::Error::InvalidParameterCount`].
    pub(crate) fn query(&self, statement: &str, params: &[Value]) -> Result<(Vec<Row>, u64)> {
        let mut stmt = self.conn.prepare(statement)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        if columns.is_empty() {
            let affected = stmt.execute(params_from_iter(params.iter()))?;
            return Ok((Vec::new(), affected as u64));
        }

        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let values = (0..columns.len())
                .map(|i| row.get_ref(i).map(value_from_ref))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            out.push(Row::new(columns.clone(), values));
        }
        let count = out.len() as u64;
        Ok((out, count))
    }

    /// Runs one or more statements without parameters or results.
    pub(crate) fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Borrows the underlying connection.
    #[must_use]
    pub const fn inner(&self) -> &Connection {
        &self.conn
    }

    /// Closes the connection, surfacing any error `SQLite` reports on close.
    pub(crate) fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| Error::Sqlite(e))
    }
}

/// Configures a `SQLite` connection for concurrent use.
///
/// - **WAL mode**: concurrent readers with a single writer
/// - **NORMAL synchronous**: fsync at checkpoints only
/// - **`busy_timeout`**: wait for locks instead of failing with `SQLITE_BUSY`
///
/// In-memory databases report `memory` as their journal mode; WAL does not
/// apply to them and that is not an error.
///
/// # Errors
///
/// Returns an error if a pragma cannot be applied.
pub fn configure_connection(conn: &Connection, busy_timeout: Duration) -> Result<()> {
    conn.busy_timeout(busy_timeout)?;
    // journal_mode returns the resulting mode as a row, so it goes through a query
    let _mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(())
}

fn value_from_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Borrowed(match self {
            Self::Null => ValueRef::Null,
            Self::Integer(i) => ValueRef::Integer(*i),
            Self::Real(r) => ValueRef::Real(*r),
            Self::Text(s) => ValueRef::Text(s.as_bytes()),
            Self::Blob(b) => ValueRef::Blob(b),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_configure_connection_on_file() {
        let dir = TempDir::new().unwrap();
        let conn =
            SqliteConnection::open(&dir.path().join("t.db"), Duration::from_secs(10)).unwrap();

        let journal_mode: String = conn
            .inner()
            .pragma_query_value(None, "journal_mode", |row| row.get(0))
            .unwrap();
        assert_eq!(journal_mode.to_lowercase(), "wal");

        let synchronous: i32 = conn
            .inner()
            .pragma_query_value(None, "synchronous", |row| row.get(0))
            .unwrap();
        assert_eq!(synchronous, 1, "Expected NORMAL synchronous mode (1)");

        let busy_timeout: i32 = conn
            .inner()
            .pragma_query_value(None, "busy_timeout", |row| row.get(0))
            .unwrap();
        assert_eq!(busy_timeout, 10_000);
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("t.db");
        let conn = SqliteConnection::open(&path, Duration::from_secs(1)).unwrap();
        conn.close().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_query_returns_named_rows() {
        let conn = SqliteConnection::open_in_memory(Duration::from_secs(1)).unwrap();
        conn.execute_batch("CREATE TABLE t (a TEXT, b INTEGER)").unwrap();

        let (_, affected) = conn
            .query("INSERT INTO t (a, b) VALUES (?, ?)", &[Value::from("x"), Value::Integer(7)])
            .unwrap();
        assert_eq!(affected, 1);

        let (rows, _) = conn.query("SELECT a, b FROM t", &[]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("a").as_deref(), Some("x"));
        assert_eq!(rows[0].integer("b"), Some(7));
    }

    #[test]
    fn test_parameter_count_mismatch_is_engine_error() {
        let conn = SqliteConnection::open_in_memory(Duration::from_secs(1)).unwrap();
        conn.execute_batch("CREATE TABLE t (a TEXT)").unwrap();
        let result = conn.query("INSERT INTO t (a) VALUES (?)", &[]);
        assert!(matches!(
            result,
            Err(Error::Sqlite(rusqlite::Error::InvalidParameterCount(0, 1)))
        ));
    }
}
