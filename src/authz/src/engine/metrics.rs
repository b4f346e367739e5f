//! Decision metrics with Prometheus text export

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::cache::CacheStats;
use crate::types::Decision;

/// Maximum latency samples kept for percentiles
const MAX_LATENCY_SAMPLES: usize = 10_000;

/// Snapshot of decision point counters
#[derive(Debug, Clone, Default)]
pub struct DecisionMetrics {
    /// Decisions produced
    pub total_decisions: u64,

    /// Permit decisions
    pub permits: u64,

    /// Deny decisions (explicit, implicit and over-limit)
    pub denies: u64,

    /// Denies with no matching statement
    pub implicit_denies: u64,

    /// Policies rejected for exceeding condition limits
    pub rejected_policies: u64,

    /// Requests that failed without a decision
    pub errors: u64,

    /// Requests that exceeded the evaluation deadline
    pub timeouts: u64,

    /// Latency percentiles, computed when the snapshot is taken
    pub latency_p50_ms: f64,
    pub latency_p95_ms: f64,
    pub latency_p99_ms: f64,

    /// Mean latency
    pub avg_latency_ms: f64,
}

impl DecisionMetrics {
    /// Share of decisions that were permits
    pub fn permit_rate(&self) -> f64 {
        if self.total_decisions == 0 {
            0.0
        } else {
            self.permits as f64 / self.total_decisions as f64
        }
    }
}

/// Collects decision outcomes and latencies
///
/// Recording only appends a sample; percentiles are derived on
/// [`snapshot`](Self::snapshot) and export.
pub struct MetricsCollector {
    metrics: Arc<RwLock<DecisionMetrics>>,
    latency_samples: Arc<RwLock<VecDeque<f64>>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(RwLock::new(DecisionMetrics::default())),
            latency_samples: Arc::new(RwLock::new(VecDeque::with_capacity(1_024))),
        }
    }

    /// Record a produced decision and its latency
    pub async fn record_decision(&self, decision: &Decision, latency: Duration) {
        {
            let mut metrics = self.metrics.write().await;
            metrics.total_decisions += 1;
            if decision.is_permitted() {
                metrics.permits += 1;
            } else {
                metrics.denies += 1;
                if decision.matched_policies.is_empty() {
                    metrics.implicit_denies += 1;
                }
            }
        }
        self.record_latency(latency).await;
    }

    /// Record a policy rejected by the condition limits
    pub async fn record_rejected_policy(&self) {
        self.metrics.write().await.rejected_policies += 1;
    }

    /// Record a failed request
    pub async fn record_error(&self) {
        self.metrics.write().await.errors += 1;
    }

    /// Record a request that hit the deadline
    pub async fn record_timeout(&self) {
        let mut metrics = self.metrics.write().await;
        metrics.timeouts += 1;
        metrics.errors += 1;
    }

    async fn record_latency(&self, latency: Duration) {
        let mut samples = self.latency_samples.write().await;
        if samples.len() == MAX_LATENCY_SAMPLES {
            samples.pop_front();
        }
        samples.push_back(latency.as_secs_f64() * 1000.0);
    }

    /// Current snapshot
    pub async fn snapshot(&self) -> DecisionMetrics {
        let mut metrics = self.metrics.read().await.clone();

        let mut sorted: Vec<f64> = self.latency_samples.read().await.iter().copied().collect();
        if !sorted.is_empty() {
            sorted.sort_by(f64::total_cmp);
            metrics.avg_latency_ms = sorted.iter().sum::<f64>() / sorted.len() as f64;
            metrics.latency_p50_ms = percentile(&sorted, 0.50);
            metrics.latency_p95_ms = percentile(&sorted, 0.95);
            metrics.latency_p99_ms = percentile(&sorted, 0.99);
        }
        metrics
    }

    /// Clear all counters and samples
    pub async fn reset(&self) {
        *self.metrics.write().await = DecisionMetrics::default();
        self.latency_samples.write().await.clear();
    }

    /// Prometheus text exposition, including regex cache counters
    pub async fn export_prometheus(&self, regex_cache: &CacheStats) -> String {
        let metrics = self.snapshot().await;

        format!(
            r#"# HELP abac_decisions_total Decisions produced, by result
# TYPE abac_decisions_total counter
abac_decisions_total{{result="permit"}} {}
abac_decisions_total{{result="deny"}} {}

# HELP abac_implicit_denies_total Denies with no matching statement
# TYPE abac_implicit_denies_total counter
abac_implicit_denies_total {}

# HELP abac_rejected_policies_total Policies rejected by condition limits
# TYPE abac_rejected_policies_total counter
abac_rejected_policies_total {}

# HELP abac_errors_total Requests failed without a decision
# TYPE abac_errors_total counter
abac_errors_total {}

# HELP abac_timeouts_total Requests that exceeded the evaluation deadline
# TYPE abac_timeouts_total counter
abac_timeouts_total {}

# HELP abac_decision_latency_seconds Decision latency percentiles
# TYPE abac_decision_latency_seconds summary
abac_decision_latency_seconds{{quantile="0.5"}} {}
abac_decision_latency_seconds{{quantile="0.95"}} {}
abac_decision_latency_seconds{{quantile="0.99"}} {}

# HELP abac_regex_cache_entries Compiled regexes cached
# TYPE abac_regex_cache_entries gauge
abac_regex_cache_entries {}

# HELP abac_regex_cache_lookups_total Regex cache lookups, by outcome
# TYPE abac_regex_cache_lookups_total counter
abac_regex_cache_lookups_total{{outcome="hit"}} {}
abac_regex_cache_lookups_total{{outcome="miss"}} {}
"#,
            metrics.permits,
            metrics.denies,
            metrics.implicit_denies,
            metrics.rejected_policies,
            metrics.errors,
            metrics.timeouts,
            metrics.latency_p50_ms / 1000.0,
            metrics.latency_p95_ms / 1000.0,
            metrics.latency_p99_ms / 1000.0,
            regex_cache.size,
            regex_cache.hits,
            regex_cache.misses,
        )
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() as f64) * p) as usize;
    sorted[idx.min(sorted.len() - 1)]
}
