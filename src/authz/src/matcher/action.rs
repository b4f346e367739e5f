//! Action pattern matching

use std::sync::Arc;

use super::segment::{segments_match, SEGMENT_SEPARATOR};
use crate::cache::RegexCache;

/// Matches `service:resource-type:verb` actions against statement patterns
///
/// ```text
/// "*"                          matches every action
/// "document-service:file:*"    matches document-service:file:read (and deeper)
/// "*:file:read"                matches any service's file:read
/// "document-service:file:re*"  matches read, render, ...
/// ```
#[derive(Debug, Clone)]
pub struct ActionMatcher {
    regex_cache: Arc<RegexCache>,
}

impl ActionMatcher {
    pub fn new(regex_cache: Arc<RegexCache>) -> Self {
        Self { regex_cache }
    }

    /// Whether `action` matches `pattern`
    pub fn matches(&self, pattern: &str, action: &str) -> bool {
        if pattern.is_empty() || action.is_empty() {
            return false;
        }
        let pattern: Vec<&str> = pattern.split(SEGMENT_SEPARATOR).collect();
        let action: Vec<&str> = action.split(SEGMENT_SEPARATOR).collect();
        segments_match(&pattern, &action, &self.regex_cache)
    }

    /// Whether `action` matches any of `patterns`
    pub fn matches_any<'a, I>(&self, patterns: I, action: &str) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        patterns.into_iter().any(|pattern| self.matches(pattern, action))
    }
}

impl Default for ActionMatcher {
    fn default() -> Self {
        Self::new(Arc::new(RegexCache::new()))
    }
}
