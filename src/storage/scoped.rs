//! Unit-of-work connection scope.
//!
//! A [`ScopedConnection`] is created when a unit of work starts (one inbound
//! request, one CLI command) and handed explicitly to repository calls. It
//! opens at most one connection, lazily, and closes it when released or
//! dropped, so error paths release the connection too.

use super::connection::{Connection, ConnectionProvider};
use crate::Result;
use tracing::{debug, warn};

/// The connection bound to a single unit of work.
///
/// Not `Sync`: a scope belongs to exactly one unit of work and is never
/// shared between concurrent ones.
pub struct ScopedConnection<'p> {
    provider: &'p ConnectionProvider,
    conn: Option<Connection>,
}

impl<'p> ScopedConnection<'p> {
    /// Starts a scope. No connection is opened until [`ScopedConnection::get`].
    #[must_use]
    pub const fn new(provider: &'p ConnectionProvider) -> Self {
        Self {
            provider,
            conn: None,
        }
    }

    /// Returns the unit's connection, opening it on first access.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if the connection cannot be opened.
    pub fn get(&mut self) -> Result<&mut Connection> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => self.provider.open_connection()?,
        };
        Ok(self.conn.insert(conn))
    }

    /// Returns true once a connection has been opened.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Id of the open connection, if any.
    #[must_use]
    pub fn connection_id(&self) -> Option<u64> {
        self.conn.as_ref().map(Connection::id)
    }

    /// Ends the unit of work, closing the connection if one was opened.
    ///
    /// Uncommitted writes are rolled back. Safe to call when nothing was
    /// opened.
    ///
    /// # Errors
    ///
    /// Returns the engine's error from rollback or close. The connection is
    /// gone either way.
    pub fn release(mut self) -> Result<()> {
        self.close_connection()
    }

    fn close_connection(&mut self) -> Result<()> {
        match self.conn.take() {
            Some(conn) => {
                let id = conn.id();
                let result = conn.close();
                debug!(connection = id, "scoped connection released");
                result
            },
            None => Ok(()),
        }
    }
}

impl Drop for ScopedConnection<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.close_connection() {
            warn!(error = %e, "failed to release scoped connection");
        }
    }
}

impl ConnectionProvider {
    /// Starts a unit-of-work scope on this provider.
    #[must_use]
    pub const fn scope(&self) -> ScopedConnection<'_> {
        ScopedConnection::new(self)
    }

    /// Runs `work` inside a fresh scope and releases it afterwards.
    ///
    /// The scope is released whether `work` succeeds or fails. An error from
    /// `work` takes precedence over an error from the release.
    ///
    /// # Errors
    ///
    /// Returns the error from `work`, or else the error from releasing.
    pub fn unit_of_work<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&mut ScopedConnection<'_>) -> Result<T>,
    {
        let mut scope = self.scope();
        let outcome = work(&mut scope);
        let released = scope.release();
        let value = outcome?;
        released?;
        Ok(value)
    }
}
