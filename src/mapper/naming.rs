//! Canonical snake_case names for tables and columns.

use crate::mapper::config::Substitution;
use once_cell::sync::Lazy;
use regex::Regex;

static FIRST_CAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(.)([A-Z][a-z]+)").unwrap());

static ALL_CAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());

static UNDERSCORE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"_{3,}").unwrap());

/// Convert a raw key or table name to lowercase, `_`-delimited form.
///
/// `-` and `#` are dropped (XML attribute and text markers), camelCase and
/// PascalCase compounds are split, and a run of three or more underscores
/// (a split landing next to an existing `__` separator) is folded back to `__`.
pub fn normalize(raw: &str) -> String {
    let stripped: String = raw.chars().filter(|c| *c != '-' && *c != '#').collect();
    let snake = FIRST_CAP.replace_all(&stripped, "${1}_${2}");
    let snake = ALL_CAP.replace_all(&snake, "${1}_${2}");

    UNDERSCORE_RUN.replace_all(&snake, "__").to_lowercase()
}

/// Apply substitutions in order; each pair sees the output of the previous one.
pub fn substitute(mut name: String, subs: &[Substitution]) -> String {
    for sub in subs {
        if name.contains(sub.from.as_str()) {
            name = name.replace(sub.from.as_str(), &sub.to);
        }
    }
    name
}

/// Join a column path and a key with the `__` separator
pub fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}__{}", prefix, key)
    }
}
