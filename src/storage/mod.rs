//! Storage layer abstraction.
//!
//! One uniform data-access interface over two engines:
//! - **Embedded**: `SQLite` file, WAL mode, busy timeout
//! - **Client-server**: PostgreSQL (cargo feature `postgres`)
//!
//! Leaf-first: [`Engine`] dialects → [`ConnectionProvider`] →
//! [`ScopedConnection`] → [`execute`] → [`GraduateRepository`], with
//! [`ensure_schema`] run once at startup.

// Allow significant_drop_tightening - holding a connection to the end of a
// scope is the point of a unit of work.
#![allow(clippy::significant_drop_tightening)]
// Allow cast_possible_truncation for row counts (usize/u64 on 64-bit targets).
#![allow(clippy::cast_possible_truncation)]

pub mod connection;
pub mod engine;
pub mod executor;
mod metrics;
pub mod postgresql;
pub mod repository;
pub mod row;
pub mod schema;
pub mod scoped;
pub mod sql;
pub mod sqlite;

pub use connection::{Backend, Connection, ConnectionProvider};
pub use engine::{CANONICAL_PLACEHOLDER, Engine, count_placeholders, is_read_only};
pub use executor::{Fetch, QueryResult, execute};
#[cfg(feature = "postgres")]
pub use postgresql::PostgresConnection;
pub use repository::GraduateRepository;
pub use row::{Row, Value};
pub use schema::{POSTGRES_DDL, SQLITE_DDL, ensure_schema};
pub use scoped::ScopedConnection;
pub use sql::{contains_pattern, escape_like_wildcards};
pub use sqlite::{SqliteConnection, configure_connection};
