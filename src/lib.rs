//! # Egresados
//!
//! Storage core for a graduate ("egresado") roster.
//!
//! The crate presents one uniform data-access layer over two relational
//! engines: an embedded `SQLite` file and a PostgreSQL server. The engine is
//! chosen once, from configuration, by the presence of a connection string.
//!
//! ## Layers
//!
//! - [`storage::ConnectionProvider`] opens tuned connections for the selected engine
//! - [`storage::ScopedConnection`] binds one connection to a unit of work
//! - [`storage::execute`] rewrites canonical `?` placeholders and runs a statement
//! - [`storage::ensure_schema`] creates the `egresados` table with engine-specific checks
//! - [`storage::GraduateRepository`] exposes the record operations
//!
//! ## Example
//!
//! ```rust,no_run
//! use egresados::config::StorageConfig;
//! use egresados::models::Graduate;
//! use egresados::storage::{ConnectionProvider, GraduateRepository, ensure_schema};
//!
//! let provider = ConnectionProvider::new(StorageConfig::default().with_sqlite_path("roster.db"))?;
//! ensure_schema(&provider)?;
//!
//! let mut scope = provider.scope();
//! let mut repo = GraduateRepository::new(&mut scope);
//! repo.add(&Graduate::new("20231234", "Ana Pérez"))?;
//! let found = repo.get("20231234")?;
//! scope.release()?;
//! # Ok::<(), egresados::Error>(())
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod cli;
pub mod config;
pub mod models;
pub mod observability;
pub mod storage;

pub use config::StorageConfig;
pub use models::{CareerCount, CareerSummary, Graduate, GraduateFields};
pub use storage::{
    ConnectionProvider, Engine, GraduateRepository, Row, ScopedConnection, Value, ensure_schema,
};

/// Error type for egresados operations.
///
/// Engine errors are carried unchanged in [`Error::Sqlite`] and
/// [`Error::Postgres`]; nothing in the storage layer rewrites them.
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Malformed configuration values, unreadable CLI input |
/// | `OperationFailed` | I/O errors, runtime construction, logging setup |
/// | `FeatureNotEnabled` | `DATABASE_URL` set but the `postgres` feature is off |
/// | `Sqlite` | Any error reported by `SQLite` (constraints, busy, binding) |
/// | `Postgres` | Any error reported by PostgreSQL or its driver |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// Feature not enabled (requires feature flag).
    #[error("feature not enabled: {0} (compile with --features {0})")]
    FeatureNotEnabled(String),

    /// Error reported by the embedded engine.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// Error reported by the client-server engine.
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    Postgres(#[from] tokio_postgres::Error),
}

impl Error {
    /// Returns true when the engine rejected a write because of a table
    /// constraint (primary key, `CHECK`, `NOT NULL`).
    #[must_use]
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            Self::Sqlite(e) => {
                e.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation)
            },
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => e
                .code()
                .is_some_and(|state| state.code().starts_with("23")),
            _ => false,
        }
    }
}

/// Result type alias for egresados operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("bad timeout".to_string());
        assert_eq!(err.to_string(), "invalid input: bad timeout");

        let err = Error::OperationFailed {
            operation: "open_log_file".to_string(),
            cause: "denied".to_string(),
        };
        assert_eq!(err.to_string(), "operation 'open_log_file' failed: denied");

        let err = Error::FeatureNotEnabled("postgres".to_string());
        assert_eq!(
            err.to_string(),
            "feature not enabled: postgres (compile with --features postgres)"
        );
    }

    #[test]
    fn test_non_engine_errors_are_not_constraint_violations() {
        assert!(!Error::InvalidInput("x".to_string()).is_constraint_violation());
        assert!(!Error::Sqlite(rusqlite::Error::QueryReturnedNoRows).is_constraint_violation());
    }
}
