//! String operators

use serde_json::Value;

use super::{as_text, expected_items};
use crate::cache::RegexCache;
use crate::matcher::segment::wildcard_to_regex;

fn any_expected(expected: &Value, mut f: impl FnMut(&str) -> bool) -> bool {
    expected_items(expected)
        .into_iter()
        .filter_map(as_text)
        .any(|e| f(&e))
}

/// `StringEquals`: equal to any expected value
pub fn equals(actual: &Value, expected: &Value) -> bool {
    let Some(actual) = as_text(actual) else {
        return false;
    };
    any_expected(expected, |e| e == actual)
}

/// `StringNotEquals`: a string actual equal to none of the expected values
pub fn not_equals(actual: &Value, expected: &Value) -> bool {
    let Some(actual) = as_text(actual) else {
        return false;
    };
    let expected: Vec<_> = expected_items(expected).into_iter().filter_map(as_text).collect();
    !expected.is_empty() && expected.iter().all(|e| *e != actual)
}

/// `StringEqualsIgnoreCase`
pub fn equals_ignore_case(actual: &Value, expected: &Value) -> bool {
    let Some(actual) = as_text(actual) else {
        return false;
    };
    any_expected(expected, |e| e.to_lowercase() == actual.to_lowercase())
}

/// `StringLike`: `*` wildcard match against any expected pattern
pub fn like(actual: &Value, expected: &Value, cache: &RegexCache) -> bool {
    let Some(actual) = as_text(actual) else {
        return false;
    };
    any_expected(expected, |pattern| like_match(pattern, &actual, cache))
}

/// Match one `StringLike` pattern
///
/// `*x*` is contains, `x*` prefix, `*x` suffix, no `*` exact; interior wildcards
/// fall back to an anchored regex.
pub fn like_match(pattern: &str, value: &str, cache: &RegexCache) -> bool {
    if !pattern.contains('*') {
        return pattern == value;
    }

    let inner = pattern.trim_matches('*');
    if inner.is_empty() {
        return true;
    }
    if inner.contains('*') {
        return cache.is_match(&wildcard_to_regex(pattern), value);
    }

    match (pattern.starts_with('*'), pattern.ends_with('*')) {
        (true, true) => value.contains(inner),
        (true, false) => value.ends_with(inner),
        (false, true) => value.starts_with(inner),
        (false, false) => value == inner,
    }
}

/// `StringContains`
pub fn contains(actual: &Value, expected: &Value) -> bool {
    let Some(actual) = as_text(actual) else {
        return false;
    };
    any_expected(expected, |e| actual.contains(e))
}

/// `StringStartsWith`
pub fn starts_with(actual: &Value, expected: &Value) -> bool {
    let Some(actual) = as_text(actual) else {
        return false;
    };
    any_expected(expected, |e| actual.starts_with(e))
}

/// `StringEndsWith`
pub fn ends_with(actual: &Value, expected: &Value) -> bool {
    let Some(actual) = as_text(actual) else {
        return false;
    };
    any_expected(expected, |e| actual.ends_with(e))
}

/// `StringRegex`: match against any expected pattern; invalid patterns never match
pub fn regex(actual: &Value, expected: &Value, cache: &RegexCache) -> bool {
    let Some(actual) = as_text(actual) else {
        return false;
    };
    any_expected(expected, |pattern| cache.is_match(pattern, &actual))
}
