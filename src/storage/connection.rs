//! Connection provider and engine-neutral connection handle.
//!
//! The engine is decided once, when the [`ConnectionProvider`] is built from
//! configuration. Every [`Connection`] it opens hides its engine behind the
//! [`Backend`] trait, so nothing above this module checks engine identity.

use super::engine::Engine;
use super::row::{Row, Value};
use super::sqlite::SqliteConnection;
use crate::config::StorageConfig;
use crate::{Error, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Source of process-unique connection ids.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Operations every engine connection provides.
///
/// Implementations convert native rows into [`Row`] so that column access
/// by name behaves identically for every engine.
pub trait Backend: Send {
    /// The engine this connection talks to.
    fn engine(&self) -> Engine;

    /// Runs one statement already in the engine's placeholder syntax.
    ///
    /// Returns the produced rows and, for statements without a result set,
    /// the number of affected rows (row count otherwise).
    fn query(&mut self, statement: &str, params: &[Value]) -> Result<(Vec<Row>, u64)>;

    /// Runs parameterless SQL, possibly several statements.
    fn execute_batch(&mut self, sql: &str) -> Result<()>;

    /// Closes the connection.
    fn close(self: Box<Self>) -> Result<()>;
}

impl Backend for SqliteConnection {
    fn engine(&self) -> Engine {
        Engine::Embedded
    }

    fn query(&mut self, statement: &str, params: &[Value]) -> Result<(Vec<Row>, u64)> {
        Self::query(self, statement, params)
    }

    fn execute_batch(&mut self, sql: &str) -> Result<()> {
        Self::execute_batch(self, sql)
    }

    fn close(self: Box<Self>) -> Result<()> {
        Self::close(*self)
    }
}

/// An open storage connection with its transaction state.
///
/// Writes run inside a transaction that is opened on demand and ended by
/// [`Connection::commit`]. Anything still pending when the connection is
/// closed is rolled back.
pub struct Connection {
    id: u64,
    engine: Engine,
    backend: Box<dyn Backend>,
    in_transaction: bool,
}

impl Connection {
    /// Wraps an opened backend.
    #[must_use]
    pub fn new(backend: Box<dyn Backend>) -> Self {
        Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            engine: backend.engine(),
            backend,
            in_transaction: false,
        }
    }

    /// Process-unique id of this connection.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// The engine behind this connection.
    #[must_use]
    pub const fn engine(&self) -> Engine {
        self.engine
    }

    /// Returns true while uncommitted writes may be pending.
    #[must_use]
    pub const fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Runs a statement already rewritten for this engine.
    pub(crate) fn query(&mut self, statement: &str, params: &[Value]) -> Result<(Vec<Row>, u64)> {
        self.backend.query(statement, params)
    }

    /// Runs parameterless SQL outside the transaction bookkeeping.
    ///
    /// # Errors
    ///
    /// Returns the engine's error unchanged.
    pub fn execute_batch(&mut self, sql: &str) -> Result<()> {
        self.backend.execute_batch(sql)
    }

    /// Opens a transaction unless one is already pending.
    pub(crate) fn begin(&mut self) -> Result<()> {
        if !self.in_transaction {
            self.backend.execute_batch("BEGIN")?;
            self.in_transaction = true;
        }
        Ok(())
    }

    /// Durably persists pending writes. A no-op when nothing is pending.
    ///
    /// # Errors
    ///
    /// Returns the engine's error, e.g. a lock timeout on `SQLite`.
    pub fn commit(&mut self) -> Result<()> {
        if self.in_transaction {
            self.backend.execute_batch("COMMIT")?;
            self.in_transaction = false;
            debug!(connection = self.id, "committed");
        }
        Ok(())
    }

    /// Discards pending writes. A no-op when nothing is pending.
    ///
    /// # Errors
    ///
    /// Returns the engine's error.
    pub fn rollback(&mut self) -> Result<()> {
        if self.in_transaction {
            // cleared first: a failed ROLLBACK leaves nothing worth retrying
            self.in_transaction = false;
            self.backend.execute_batch("ROLLBACK")?;
            debug!(connection = self.id, "rolled back");
        }
        Ok(())
    }

    /// Rolls back anything pending and closes the connection.
    ///
    /// # Errors
    ///
    /// Returns the first error from the rollback or the close.
    pub fn close(mut self) -> Result<()> {
        let rolled_back = self.rollback();
        let closed = self.backend.close();
        debug!(connection = self.id, engine = %self.engine, "connection closed");
        rolled_back.and(closed)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("engine", &self.engine)
            .field("in_transaction", &self.in_transaction)
            .finish_non_exhaustive()
    }
}

/// Opens connections to the configured engine.
///
/// Cheap to share between threads; each call to
/// [`ConnectionProvider::open_connection`] returns an independent connection.
#[derive(Debug, Clone)]
pub struct ConnectionProvider {
    config: StorageConfig,
    engine: Engine,
}

impl ConnectionProvider {
    /// Creates a provider for the engine the configuration selects.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FeatureNotEnabled`] when a database URL is configured
    /// but the crate was built without the `postgres` feature. There is no
    /// fallback to `SQLite` in that case.
    pub fn new(config: StorageConfig) -> Result<Self> {
        let engine = if config.uses_client_server() {
            if !cfg!(feature = "postgres") {
                return Err(Error::FeatureNotEnabled("postgres".to_string()));
            }
            Engine::ClientServer
        } else {
            Engine::Embedded
        };

        Ok(Self { config, engine })
    }

    /// The selected engine.
    #[must_use]
    pub const fn engine(&self) -> Engine {
        self.engine
    }

    /// The configuration this provider was built from.
    #[must_use]
    pub const fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Opens a new connection with engine-specific tuning applied.
    ///
    /// # Errors
    ///
    /// Returns the engine's connectivity error unchanged. Nothing is retried.
    pub fn open_connection(&self) -> Result<Connection> {
        let backend = self.open_backend()?;
        let conn = Connection::new(backend);
        metrics::counter!("storage_connections_opened_total", "backend" => self.engine.name())
            .increment(1);
        debug!(connection = conn.id(), engine = %self.engine, "connection opened");
        Ok(conn)
    }

    fn open_backend(&self) -> Result<Box<dyn Backend>> {
        match self.engine {
            Engine::Embedded => Ok(Box::new(SqliteConnection::open(
                &self.config.sqlite_path,
                self.config.busy_timeout,
            )?)),
            Engine::ClientServer => self.open_client_server(),
        }
    }

    #[cfg(feature = "postgres")]
    fn open_client_server(&self) -> Result<Box<dyn Backend>> {
        let url = self
            .config
            .database_url()
            .ok_or_else(|| Error::InvalidInput("database URL is not configured".to_string()))?;
        Ok(Box::new(super::postgresql::PostgresConnection::open(
            url,
            self.config.connect_timeout,
        )?))
    }

    #[cfg(not(feature = "postgres"))]
    fn open_client_server(&self) -> Result<Box<dyn Backend>> {
        tracing::warn!("client-server engine requested without the postgres feature");
        Err(Error::FeatureNotEnabled("postgres".to_string()))
    }
}
