//! Storage engine dialects.
//!
//! Every statement in this crate is written with `?` as its parameter
//! marker. [`Engine::rewrite_placeholders`] turns that canonical form into
//! what the active engine expects, so callers never branch on the engine.

use std::borrow::Cow;
use std::fmt;

/// The canonical parameter marker.
pub const CANONICAL_PLACEHOLDER: char = '?';

/// The relational engine behind a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Engine {
    /// Single-file in-process `SQLite` database.
    Embedded,
    /// PostgreSQL server.
    ClientServer,
}

impl Engine {
    /// Short backend name used in logs and metric labels.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Embedded => "sqlite",
            Self::ClientServer => "postgresql",
        }
    }

    /// Rewrites canonical `?` markers into the engine's native syntax.
    ///
    /// `SQLite` accepts `?` as is. PostgreSQL takes numbered `$1, $2, ...`.
    /// Markers inside single-quoted literals, quoted identifiers and `--`
    /// comments are left alone.
    #[must_use]
    pub fn rewrite_placeholders(self, statement: &str) -> Cow<'_, str> {
        match self {
            Self::Embedded => Cow::Borrowed(statement),
            Self::ClientServer => Cow::Owned(number_placeholders(statement)),
        }
    }

    /// `CREATE TABLE` statement for the `egresados` table in this dialect.
    #[must_use]
    pub const fn schema_ddl(self) -> &'static str {
        match self {
            Self::Embedded => super::schema::SQLITE_DDL,
            Self::ClientServer => super::schema::POSTGRES_DDL,
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Byte offsets of the markers that bind a parameter.
///
/// Skips single-quoted literals, double-quoted identifiers and `--` line
/// comments. A doubled quote inside a literal closes and reopens it, which
/// leaves the scan in the right state.
fn placeholder_offsets(statement: &str) -> Vec<usize> {
    let mut offsets = Vec::new();
    let mut quote: Option<char> = None;
    let mut in_comment = false;
    let mut chars = statement.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if in_comment {
            in_comment = c != '\n';
            continue;
        }
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {},
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == '-' && chars.peek().is_some_and(|&(_, n)| n == '-') => {
                chars.next();
                in_comment = true;
            },
            None if c == CANONICAL_PLACEHOLDER => offsets.push(i),
            None => {},
        }
    }

    offsets
}

/// Replaces each bindable `?` with `$n`, numbering from 1 in statement order.
fn number_placeholders(statement: &str) -> String {
    let mut out = String::with_capacity(statement.len() + 8);
    let mut copied = 0;

    for (n, offset) in placeholder_offsets(statement).into_iter().enumerate() {
        out.push_str(&statement[copied..offset]);
        out.push('$');
        out.push_str(&(n + 1).to_string());
        copied = offset + CANONICAL_PLACEHOLDER.len_utf8();
    }
    out.push_str(&statement[copied..]);

    out
}

/// Counts the canonical markers a statement expects to bind.
#[must_use]
pub fn count_placeholders(statement: &str) -> usize {
    placeholder_offsets(statement).len()
}

/// Returns true when a statement only reads (`SELECT`, `WITH`, `VALUES`, `EXPLAIN`, `PRAGMA`).
///
/// Anything else is treated as a write and runs inside the connection's
/// pending transaction.
#[must_use]
pub fn is_read_only(statement: &str) -> bool {
    let keyword = statement
        .trim_start_matches(|c: char| c.is_whitespace() || c == '(')
        .split(|c: char| !c.is_ascii_alphabetic())
        .next()
        .unwrap_or_default();

    ["SELECT", "WITH", "VALUES", "EXPLAIN", "PRAGMA"]
        .iter()
        .any(|k| keyword.eq_ignore_ascii_case(k))
}
