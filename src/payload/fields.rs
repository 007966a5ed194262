//! String attribute helpers.
//!
//! Event data is a flat `String -> String` map, so every typed field has to
//! be parsed out of text.

use std::collections::HashMap;

/// Parse a boolean flag.
///
/// Only `true` and `false` (ASCII case-insensitive, surrounding whitespace
/// ignored) are accepted.
///
/// # Examples
/// ```
/// use pushinbox_core::payload::parse_flag;
/// assert_eq!(parse_flag("TRUE"), Some(true));
/// assert_eq!(parse_flag(" false "), Some(false));
/// assert_eq!(parse_flag("yes"), None);
/// ```
pub fn parse_flag(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// True only when `key` is present and parses as the flag `true`.
pub fn flag_is_set(data: &HashMap<String, String>, key: &str) -> bool {
    data.get(key).and_then(|v| parse_flag(v)).unwrap_or(false)
}

/// Look up `key` and reject it when blank.
pub fn non_blank<'a>(data: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    data.get(key)
        .map(|s| s.as_str())
        .filter(|s| !s.trim().is_empty())
}
