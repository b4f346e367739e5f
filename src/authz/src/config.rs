//! Engine configuration

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::cache::DEFAULT_REGEX_CACHE_CAPACITY;
use crate::condition::ops::temporal::BusinessHours;
use crate::context::resolver::default_shortcuts;

/// Policy Decision Point configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Deepest condition tree accepted in a policy
    pub max_condition_depth: usize,

    /// Most condition keys (operator leaves) accepted per policy
    pub max_condition_keys: usize,

    /// Time budget for one `evaluate` call, in milliseconds
    pub max_evaluation_time_ms: u64,

    /// Compiled regexes kept per cache
    pub regex_cache_capacity: usize,

    /// Record decision metrics
    pub enable_metrics: bool,

    /// Path shortcut expansions (`user` → `user.attributes`)
    pub shortcuts: Vec<(String, String)>,

    /// Window for `IsBusinessHours`
    pub business_hours: BusinessHours,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_condition_depth: 32,
            max_condition_keys: 256,
            max_evaluation_time_ms: 1000,
            regex_cache_capacity: DEFAULT_REGEX_CACHE_CAPACITY,
            enable_metrics: true,
            shortcuts: default_shortcuts(),
            business_hours: BusinessHours::default(),
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `ABAC_*` environment variables
    ///
    /// Unset or unparsable variables keep their default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_condition_depth: env_or("ABAC_MAX_CONDITION_DEPTH", defaults.max_condition_depth),
            max_condition_keys: env_or("ABAC_MAX_CONDITION_KEYS", defaults.max_condition_keys),
            max_evaluation_time_ms: env_or("ABAC_MAX_EVALUATION_TIME_MS", defaults.max_evaluation_time_ms),
            regex_cache_capacity: env_or("ABAC_REGEX_CACHE_CAPACITY", defaults.regex_cache_capacity),
            enable_metrics: env_or("ABAC_ENABLE_METRICS", defaults.enable_metrics),
            ..defaults
        }
    }

    /// Evaluation time budget
    pub fn max_evaluation_time(&self) -> Duration {
        Duration::from_millis(self.max_evaluation_time_ms)
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
