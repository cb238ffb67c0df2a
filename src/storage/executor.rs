//! Dialect-adapting statement executor.
//!
//! Statements are authored once with `?` markers. [`execute`] rewrites them
//! for the connection's engine, binds parameters positionally, and returns
//! engine-neutral [`Row`]s.

use super::connection::Connection;
use super::engine::is_read_only;
use super::metrics::{operation_label, record_operation_metrics};
use super::row::{Row, Value};
use super::scoped::ScopedConnection;
use crate::Result;
use std::time::Instant;
use tracing::{trace, warn};

/// What to bring back from an executed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fetch {
    /// Nothing; only the affected-row count is reported.
    #[default]
    None,
    /// The first row, or `None` if the statement produced no rows.
    One,
    /// Every row, in the order the engine returned them.
    All,
}

/// Outcome of [`execute`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// Statement ran without fetching.
    Done {
        /// Rows affected by a write, or rows produced by a query.
        rows_affected: u64,
    },
    /// Result of [`Fetch::One`]; `None` is the absence marker.
    One(Option<Row>),
    /// Result of [`Fetch::All`]; possibly empty.
    All(Vec<Row>),
}

impl QueryResult {
    /// Returns the single fetched row, if any.
    #[must_use]
    pub fn into_one(self) -> Option<Row> {
        match self {
            Self::One(row) => row,
            Self::All(rows) => rows.into_iter().next(),
            Self::Done { .. } => None,
        }
    }

    /// Returns every fetched row.
    #[must_use]
    pub fn into_all(self) -> Vec<Row> {
        match self {
            Self::All(rows) => rows,
            Self::One(row) => row.into_iter().collect(),
            Self::Done { .. } => Vec::new(),
        }
    }

    /// Affected-row count of a statement run with [`Fetch::None`].
    #[must_use]
    pub const fn rows_affected(&self) -> Option<u64> {
        match self {
            Self::Done { rows_affected } => Some(*rows_affected),
            _ => None,
        }
    }
}

/// Runs one parameterized statement on a connection.
///
/// `statement` uses the canonical `?` marker; it is rewritten for the
/// connection's engine before execution. `params` bind in order and must
/// match the markers one to one, otherwise the engine's binding error is
/// returned as is.
///
/// Writes join the connection's pending transaction, opening one if needed.
/// With `commit` set, that transaction is committed after the statement
/// succeeds. If the statement fails, any pending transaction is rolled back
/// so the connection remains usable, and the engine error is returned
/// unchanged.
///
/// That rollback applies to failed reads too: uncommitted writes issued
/// earlier on the connection are discarded, and a later `commit` has nothing
/// left to persist. PostgreSQL aborts the whole transaction on any error, so
/// both engines behave the same. Callers that batch writes must treat an
/// error as the end of the batch.
///
/// # Errors
///
/// Returns the engine's error for the statement, the implicit `BEGIN`, or
/// the `COMMIT`.
pub fn execute(
    conn: &mut Connection,
    statement: &str,
    params: &[Value],
    fetch: Fetch,
    commit: bool,
) -> Result<QueryResult> {
    let engine = conn.engine();
    let operation = operation_label(statement);
    let sql = engine.rewrite_placeholders(statement);
    let start = Instant::now();

    trace!(connection = conn.id(), engine = %engine, sql = %sql, params = params.len(), "execute");

    if !is_read_only(statement) {
        conn.begin()?;
    }

    let (rows, count) = match conn.query(&sql, params) {
        Ok(out) => out,
        Err(e) => {
            if let Err(rollback_err) = conn.rollback() {
                warn!(
                    connection = conn.id(),
                    error = %rollback_err,
                    "rollback after failed statement failed"
                );
            }
            record_operation_metrics(engine.name(), operation, start, "error");
            return Err(e);
        },
    };

    if commit {
        if let Err(e) = conn.commit() {
            record_operation_metrics(engine.name(), operation, start, "error");
            return Err(e);
        }
    }

    record_operation_metrics(engine.name(), operation, start, "success");

    Ok(match fetch {
        Fetch::None => QueryResult::Done {
            rows_affected: count,
        },
        Fetch::One => QueryResult::One(rows.into_iter().next()),
        Fetch::All => QueryResult::All(rows),
    })
}

impl ScopedConnection<'_> {
    /// Runs [`execute`] on this unit's connection, opening it if needed.
    ///
    /// # Errors
    ///
    /// Returns the open error or the statement's engine error.
    pub fn execute(
        &mut self,
        statement: &str,
        params: &[Value],
        fetch: Fetch,
        commit: bool,
    ) -> Result<QueryResult> {
        execute(self.get()?, statement, params, fetch, commit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::storage::ConnectionProvider;
    use tempfile::TempDir;

    fn setup(dir: &TempDir) -> ConnectionProvider {
        let provider =
            ConnectionProvider::new(StorageConfig::new().with_sqlite_path(dir.path().join("t.db")))
                .unwrap();
        let mut conn = provider.open_connection().unwrap();
        conn.execute_batch("CREATE TABLE t (k TEXT PRIMARY KEY, v TEXT)").unwrap();
        conn.close().unwrap();
        provider
    }

    #[test]
    fn test_fetch_modes() {
        let dir = TempDir::new().unwrap();
        let provider = setup(&dir);
        let mut scope = provider.scope();

        let done = scope
            .execute(
                "INSERT INTO t (k, v) VALUES (?, ?)",
                &[Value::from("a"), Value::from("1")],
                Fetch::None,
                true,
            )
            .unwrap();
        assert_eq!(done.rows_affected(), Some(1));
        scope
            .execute(
                "INSERT INTO t (k, v) VALUES (?, ?)",
                &[Value::from("b"), Value::Null],
                Fetch::None,
                true,
            )
            .unwrap();

        let one = scope
            .execute("SELECT k, v FROM t WHERE k = ?", &[Value::from("a")], Fetch::One, false)
            .unwrap()
            .into_one()
            .unwrap();
        assert_eq!(one.text("v").as_deref(), Some("1"));

        let missing = scope
            .execute("SELECT k, v FROM t WHERE k = ?", &[Value::from("zz")], Fetch::One, false)
            .unwrap();
        assert_eq!(missing, QueryResult::One(None));

        let all = scope
            .execute("SELECT k FROM t ORDER BY k", &[], Fetch::All, false)
            .unwrap()
            .into_all();
        let keys: Vec<String> = all.iter().filter_map(|r| r.text("k")).collect();
        assert_eq!(keys, vec!["a", "b"]);
        scope.release().unwrap();
    }

    #[test]
    fn test_uncommitted_write_is_discarded_at_release() {
        let dir = TempDir::new().unwrap();
        let provider = setup(&dir);

        let mut scope = provider.scope();
        scope
            .execute("INSERT INTO t (k) VALUES (?)", &[Value::from("a")], Fetch::None, false)
            .unwrap();
        assert!(scope.get().unwrap().in_transaction());
        scope.release().unwrap();

        let mut scope = provider.scope();
        let rows = scope
            .execute("SELECT k FROM t", &[], Fetch::All, false)
            .unwrap()
            .into_all();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_failed_statement_leaves_connection_usable() {
        let dir = TempDir::new().unwrap();
        let provider = setup(&dir);
        let mut scope = provider.scope();

        scope
            .execute("INSERT INTO t (k) VALUES (?)", &[Value::from("a")], Fetch::None, true)
            .unwrap();
        let err = scope
            .execute("INSERT INTO t (k) VALUES (?)", &[Value::from("a")], Fetch::None, true)
            .unwrap_err();
        assert!(err.is_constraint_violation());
        assert!(!scope.get().unwrap().in_transaction());

        scope
            .execute("INSERT INTO t (k) VALUES (?)", &[Value::from("b")], Fetch::None, true)
            .unwrap();
    }

    #[test]
    fn test_failed_read_discards_pending_writes() {
        let dir = TempDir::new().unwrap();
        let provider = setup(&dir);
        let mut scope = provider.scope();

        scope
            .execute("INSERT INTO t (k) VALUES (?)", &[Value::from("a")], Fetch::None, false)
            .unwrap();
        assert!(scope.execute("SELECT nope FROM t", &[], Fetch::All, false).is_err());
        assert!(!scope.get().unwrap().in_transaction());

        scope.execute("SELECT 1", &[], Fetch::One, true).unwrap();
        let rows = scope
            .execute("SELECT k FROM t", &[], Fetch::All, false)
            .unwrap()
            .into_all();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_parameter_count_mismatch_surfaces_engine_error() {
        let dir = TempDir::new().unwrap();
        let provider = setup(&dir);
        let mut scope = provider.scope();
        let result = scope.execute(
            "INSERT INTO t (k, v) VALUES (?, ?)",
            &[Value::from("a")],
            Fetch::None,
            true,
        );
        assert!(matches!(
            result,
            Err(crate::Error::Sqlite(rusqlite::Error::InvalidParameterCount(1, 2)))
        ));
    }
}
