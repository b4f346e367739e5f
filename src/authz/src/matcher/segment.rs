//! Colon-segment wildcard matching shared by action and resource matchers

use crate::cache::RegexCache;

/// Segment separator within an identifier
pub const SEGMENT_SEPARATOR: char = ':';

/// Wildcard segment
pub const WILDCARD: &str = "*";

/// Anchored regex for a `*` wildcard pattern; everything else is escaped
pub fn wildcard_to_regex(pattern: &str) -> String {
    let body: Vec<String> = pattern.split('*').map(regex::escape).collect();
    format!("^{}$", body.join(".*"))
}

/// Split on `separator`, never inside a `${...}` token
pub fn split_outside_variables(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '$' if chars.peek().is_some_and(|(_, next)| *next == '{') => {
                depth += 1;
                chars.next();
            }
            '}' if depth > 0 => depth -= 1,
            c if c == separator && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Match one segment; embedded `*` compiles to an anchored regex
pub fn segment_matches(pattern: &str, candidate: &str, cache: &RegexCache) -> bool {
    if pattern == WILDCARD {
        return true;
    }
    if pattern.contains('*') {
        return cache.is_match(&wildcard_to_regex(pattern), candidate);
    }
    pattern == candidate
}

/// Match segment lists
///
/// A lone `*` matches anything. Otherwise counts must agree, unless the final
/// pattern segment is `*`: then the remaining segments are a prefix and the
/// candidate may carry any number of further segments.
pub fn segments_match(pattern: &[&str], candidate: &[&str], cache: &RegexCache) -> bool {
    if pattern == [WILDCARD] {
        return true;
    }

    match pattern.split_last() {
        Some((&WILDCARD, prefix)) => {
            candidate.len() >= prefix.len()
                && prefix
                    .iter()
                    .zip(candidate)
                    .all(|(p, c)| segment_matches(p, c, cache))
        }
        Some(_) => {
            pattern.len() == candidate.len()
                && pattern
                    .iter()
                    .zip(candidate)
                    .all(|(p, c)| segment_matches(p, c, cache))
        }
        None => false,
    }
}
