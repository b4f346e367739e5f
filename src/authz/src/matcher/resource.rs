//! Resource pattern matching
//!
//! Resources are `service:type:id` identifiers; `/` nests a child resource under
//! its parent (`api:projects:p1/api:documents:d7`). Patterns may reference context
//! values with `${namespace:key}`, substituted before matching.

use std::sync::Arc;
use tracing::{debug, warn};

use super::segment::{segments_match, split_outside_variables, SEGMENT_SEPARATOR, WILDCARD};
use crate::cache::RegexCache;
use crate::context::{substitute_pattern, EvaluationContext};

/// Hierarchy separator
pub const LEVEL_SEPARATOR: char = '/';

/// Minimum `:` segments per hierarchy level
pub const MIN_SEGMENTS: usize = 3;

/// Matches resource identifiers against statement patterns
#[derive(Debug, Clone)]
pub struct ResourceMatcher {
    regex_cache: Arc<RegexCache>,
}

impl ResourceMatcher {
    pub fn new(regex_cache: Arc<RegexCache>) -> Self {
        Self { regex_cache }
    }

    /// Whether `resource` matches `pattern` after variable substitution
    ///
    /// A malformed pattern or resource never matches.
    pub fn matches(&self, pattern: &str, resource: &str, ctx: &EvaluationContext) -> bool {
        let pattern = substitute_pattern(pattern, ctx);

        if !is_valid_resource(resource) {
            debug!("Invalid resource format '{}'", resource);
            return false;
        }
        if pattern == WILDCARD {
            return true;
        }
        if !is_valid_resource(&pattern) {
            warn!("Invalid resource pattern '{}'", pattern);
            return false;
        }

        let pattern_levels = split_outside_variables(&pattern, LEVEL_SEPARATOR);
        let resource_levels = split_outside_variables(resource, LEVEL_SEPARATOR);
        if pattern_levels.len() != resource_levels.len() {
            return false;
        }

        pattern_levels
            .iter()
            .zip(&resource_levels)
            .all(|(pattern, resource)| self.level_matches(pattern, resource))
    }

    /// Whether `resource` matches any of `patterns`
    pub fn matches_any<'a, I>(&self, patterns: I, resource: &str, ctx: &EvaluationContext) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        patterns
            .into_iter()
            .any(|pattern| self.matches(pattern, resource, ctx))
    }

    fn level_matches(&self, pattern: &str, resource: &str) -> bool {
        let pattern = split_outside_variables(pattern, SEGMENT_SEPARATOR);
        let resource = split_outside_variables(resource, SEGMENT_SEPARATOR);
        segments_match(&pattern, &resource, &self.regex_cache)
    }
}

impl Default for ResourceMatcher {
    fn default() -> Self {
        Self::new(Arc::new(RegexCache::new()))
    }
}

/// Whether every hierarchy level has at least three non-empty segments
///
/// A level that is a lone `*` is accepted.
pub fn is_valid_resource(resource: &str) -> bool {
    if resource.is_empty() {
        return false;
    }
    split_outside_variables(resource, LEVEL_SEPARATOR)
        .into_iter()
        .all(is_valid_level)
}

fn is_valid_level(level: &str) -> bool {
    if level == WILDCARD {
        return true;
    }
    let segments = split_outside_variables(level, SEGMENT_SEPARATOR);
    segments.len() >= MIN_SEGMENTS
        && segments.iter().all(|segment| !segment.is_empty())
}
