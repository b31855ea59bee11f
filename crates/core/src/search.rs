//! Keyword search helpers.
//!
//! The query is split into terms; a page matches when every term occurs
//! (case-insensitively) in its title or its current content.

use std::sync::LazyLock;

use regex::Regex;

/// Default number of results per page for list and search endpoints.
pub const DEFAULT_SEARCH_LIMIT: i64 = 50;

/// Maximum number of results per page.
pub const MAX_SEARCH_LIMIT: i64 = 200;

static TERM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]+)"|(\S+)"#).expect("valid regex"));

static MULTI_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid regex"));

/// Split a query string into keywords.
///
/// Double-quoted phrases stay together with internal whitespace collapsed.
///
/// ```
/// use folio_core::search::normalize_query;
///
/// assert_eq!(
///     normalize_query(r#"  some random  words "with   quotes  " and   spaces"#),
///     vec!["some", "random", "words", "with quotes", "and", "spaces"],
/// );
/// ```
pub fn normalize_query(query: &str) -> Vec<String> {
    TERM_RE
        .captures_iter(query)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| MULTI_SPACE_RE.replace_all(m.as_str().trim(), " ").into_owned())
        .filter(|term| !term.is_empty())
        .collect()
}

/// Build an `ILIKE` pattern matching `term` anywhere, escaping wildcards.
pub fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Clamp a user-supplied limit into `1..=max`, using `default` when absent.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, max)
}

/// Clamp a user-supplied offset to be non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}
