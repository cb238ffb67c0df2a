//! Property-based tests for statement rewriting and key constraints.
//!
//! Uses proptest to verify invariants across random inputs:
//! - Embedded statements are never rewritten
//! - Client-server numbering is sequential and covers every marker
//! - Quoted markers survive untouched
//! - The table accepts exactly the 8-digit enrollment numbers

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use egresados::config::StorageConfig;
use egresados::models::Graduate;
use egresados::storage::{
    ConnectionProvider, Engine, GraduateRepository, count_placeholders, ensure_schema,
    escape_like_wildcards,
};
use proptest::prelude::*;

/// Statement fragments without quotes, so every `?` is a real marker.
fn unquoted_statement() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("?".to_string()),
            Just(", ".to_string()),
            Just(" = ".to_string()),
            "[a-z_]{1,10}",
            "[0-9]{1,4}",
        ],
        0..30,
    )
    .prop_map(|parts| parts.join(" "))
}

/// Extracts the numbers following each `$` in order.
fn dollar_numbers(s: &str) -> Vec<usize> {
    let mut numbers = Vec::new();
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '$' {
            let mut digits = String::new();
            while let Some(d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                digits.push(*d);
                chars.next();
            }
            numbers.push(digits.parse().unwrap());
        }
    }
    numbers
}

proptest! {
    /// Property: embedded statements pass through byte for byte.
    #[test]
    fn prop_embedded_rewrite_is_identity(sql in ".{0,200}") {
        prop_assert_eq!(Engine::Embedded.rewrite_placeholders(&sql), sql.as_str());
    }

    /// Property: client-server markers are numbered 1..=n in order.
    #[test]
    fn prop_client_server_numbers_sequentially(sql in unquoted_statement()) {
        let expected = count_placeholders(&sql);
        let rewritten = Engine::ClientServer.rewrite_placeholders(&sql);

        prop_assert!(!rewritten.contains('?'));
        let numbers = dollar_numbers(&rewritten);
        prop_assert_eq!(numbers, (1..=expected).collect::<Vec<_>>());
    }

    /// Property: markers inside a string literal are not rewritten.
    #[test]
    fn prop_quoted_markers_untouched(
        before in unquoted_statement(),
        literal in "[a-z? ]{0,20}",
        after in unquoted_statement(),
    ) {
        let sql = format!("{before} '{literal}' {after}");
        let rewritten = Engine::ClientServer.rewrite_placeholders(&sql);

        let quoted = format!("'{literal}'");
        prop_assert!(rewritten.contains(&quoted));
        prop_assert_eq!(
            count_placeholders(&sql),
            count_placeholders(&before) + count_placeholders(&after)
        );
    }

    /// Property: escaping leaves no bare LIKE wildcard behind.
    #[test]
    fn prop_escaped_wildcards_are_prefixed(s in ".{0,50}") {
        let escaped = escape_like_wildcards(&s);
        let mut chars = escaped.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                let next = chars.next();
                prop_assert!(matches!(next, Some('%' | '_' | '\\')));
            } else {
                prop_assert!(c != '%' && c != '_');
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: the table accepts a key iff it is exactly eight ASCII digits.
    #[test]
    fn prop_matricula_check_matches_format(matricula in prop_oneof![
        "[0-9]{8}",
        "[0-9]{0,7}",
        "[0-9]{9,12}",
        "[0-9]{3}[a-zA-Z -][0-9]{4}",
    ]) {
        let dir = tempfile::TempDir::new().unwrap();
        let provider = ConnectionProvider::new(
            StorageConfig::new().with_sqlite_path(dir.path().join("p.db")),
        )
        .unwrap();
        ensure_schema(&provider).unwrap();

        let result = provider.unit_of_work(|scope| {
            GraduateRepository::new(scope).add(&Graduate::new(matricula.as_str(), "Prueba"))
        });

        let well_formed = matricula.len() == 8 && matricula.bytes().all(|b| b.is_ascii_digit());
        prop_assert_eq!(result.is_ok(), well_formed);
        if let Err(e) = result {
            prop_assert!(e.is_constraint_violation());
        }
    }
}
