//! Compiled regular expression cache
//!
//! Shared by the condition evaluator (`StringRegex`, interior `StringLike`
//! wildcards) and the pattern matchers (embedded `*` segments). Entries are keyed
//! by the final pattern text, after any variable substitution, so two contexts that
//! substitute different values never share a compiled program by accident.
//!
//! The map is a `DashMap`; two threads missing on the same pattern may both compile
//! it, and the second insert simply replaces the first.

use dashmap::DashMap;
use regex::Regex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Default maximum number of cached programs
pub const DEFAULT_REGEX_CACHE_CAPACITY: usize = 1024;

/// Thread-safe cache of compiled regular expressions
#[derive(Debug)]
pub struct RegexCache {
    /// Compiled programs keyed by pattern text
    entries: DashMap<String, Arc<Regex>>,
    /// Maximum number of entries; beyond it patterns are compiled uncached
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RegexCache {
    /// Create a cache with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_REGEX_CACHE_CAPACITY)
    }

    /// Create a cache holding at most `capacity` programs
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the compiled program for `pattern`, compiling it on a miss
    pub fn get_or_compile(&self, pattern: &str) -> Result<Arc<Regex>, regex::Error> {
        if let Some(regex) = self.entries.get(pattern) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(regex.value()));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let regex = Arc::new(Regex::new(pattern)?);

        if self.entries.len() < self.capacity {
            self.entries.insert(pattern.to_string(), Arc::clone(&regex));
        }

        Ok(regex)
    }

    /// Match `value` against `pattern`; invalid patterns never match
    pub fn is_match(&self, pattern: &str, value: &str) -> bool {
        match self.get_or_compile(pattern) {
            Ok(regex) => regex.is_match(value),
            Err(e) => {
                tracing::warn!("Invalid regex pattern '{}': {}", pattern, e);
                false
            }
        }
    }

    /// Number of cached programs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every cached program
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for RegexCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached programs
    pub size: usize,
    /// Lookups served from the cache
    pub hits: u64,
    /// Lookups that required compilation
    pub misses: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
