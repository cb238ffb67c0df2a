//! SQL helper functions.

/// Escape character used with `LIKE ... ESCAPE '\'`.
pub const LIKE_ESCAPE: char = '\\';

/// Escapes SQL LIKE wildcards in a string to make them literal.
///
/// `%` and `_` are `LIKE` wildcards and `\` is the escape character, so all
/// three are prefixed with `\`. Pair with `ESCAPE '\'` in the statement;
/// both engines honour it.
///
/// # Examples
///
/// ```
/// use egresados::storage::escape_like_wildcards;
///
/// assert_eq!(escape_like_wildcards("100%"), "100\\%");
/// assert_eq!(escape_like_wildcards("user_name"), "user\\_name");
/// assert_eq!(escape_like_wildcards("path\\file"), "path\\\\file");
/// ```
#[must_use]
pub fn escape_like_wildcards(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' | '_' | LIKE_ESCAPE => {
                result.push(LIKE_ESCAPE);
                result.push(c);
            },
            _ => result.push(c),
        }
    }
    result
}

/// Builds a `%term%` substring pattern with wildcards in `term` escaped.
#[must_use]
pub fn contains_pattern(term: &str) -> String {
    format!("%{}%", escape_like_wildcards(term))
}
