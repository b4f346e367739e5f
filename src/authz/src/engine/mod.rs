//! Policy Decision Point
//!
//! Combines statement verdicts with deny-override: the first matching Deny
//! statement ends evaluation with `deny`; otherwise any matching Allow statement
//! yields `permit`; with no match the request is implicitly denied.

pub mod limits;
pub mod metrics;

pub use limits::{ConditionLimits, LimitViolation};
pub use metrics::{DecisionMetrics, MetricsCollector};

use crate::cache::RegexCache;
use crate::condition::ConditionEvaluator;
use crate::config::EngineConfig;
use crate::context::EvaluationContext;
use crate::enrichment::AttributeResolver;
use crate::error::{AuthzError, Result};
use crate::matcher::{ActionMatcher, ResourceMatcher};
use crate::policy::{Effect, Policy, PolicyStore, Statement};
use crate::types::{Decision, EvaluationRequest, StatementMatch};

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Reason for a request no statement matched
pub const IMPLICIT_DENY_REASON: &str = "No matching policies found (implicit deny)";

/// Policy Decision Point
///
/// # Architecture
///
/// ```text
/// Request → AttributeResolver → PolicyStore → limits → deny-override → Decision
///                                               ↓            ↓
///                                      ActionMatcher / ResourceMatcher / ConditionEvaluator
///                                               ↓
///                                          [RegexCache]            [Metrics]
/// ```
///
/// [`decide`](Self::decide) is the pure core and needs no collaborators;
/// [`evaluate`](Self::evaluate) adds enrichment, policy retrieval, the time
/// budget and metrics.
pub struct PolicyDecisionPoint {
    /// Policy storage backend
    store: Option<Arc<dyn PolicyStore>>,

    /// Subject/resource attribute lookup
    attributes: Option<Arc<dyn AttributeResolver>>,

    evaluator: ConditionEvaluator,
    actions: ActionMatcher,
    resources: ResourceMatcher,

    /// Shared by the evaluator and both matchers
    regex_cache: Arc<RegexCache>,

    limits: ConditionLimits,
    metrics: Option<Arc<MetricsCollector>>,
    config: EngineConfig,
}

/// Outcome of the deny-override scan
struct Verdict {
    decision: Decision,
    rejected_policy: bool,
}

impl PolicyDecisionPoint {
    /// Create a decision point with its own regex cache
    pub fn new(config: EngineConfig) -> Self {
        let regex_cache = Arc::new(RegexCache::with_capacity(config.regex_cache_capacity));
        Self::with_regex_cache(config, regex_cache)
    }

    /// Create a decision point sharing an existing regex cache
    pub fn with_regex_cache(config: EngineConfig, regex_cache: Arc<RegexCache>) -> Self {
        let metrics = config.enable_metrics.then(|| Arc::new(MetricsCollector::new()));

        info!(
            "PolicyDecisionPoint initialized with max_depth={}, max_keys={}, timeout={}ms, metrics={}",
            config.max_condition_depth, config.max_condition_keys, config.max_evaluation_time_ms, config.enable_metrics
        );

        Self {
            store: None,
            attributes: None,
            evaluator: ConditionEvaluator::from_config(&config, Arc::clone(&regex_cache)),
            actions: ActionMatcher::new(Arc::clone(&regex_cache)),
            resources: ResourceMatcher::new(Arc::clone(&regex_cache)),
            regex_cache,
            limits: ConditionLimits::from_config(&config),
            metrics,
            config,
        }
    }

    /// Attach the policy store used by [`evaluate`](Self::evaluate)
    pub fn with_policy_store(mut self, store: Arc<dyn PolicyStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Attach the attribute resolver used by [`evaluate`](Self::evaluate)
    pub fn with_attribute_resolver(mut self, attributes: Arc<dyn AttributeResolver>) -> Self {
        self.attributes = Some(attributes);
        self
    }

    /// Evaluate a request end to end
    ///
    /// # Pipeline
    ///
    /// 1. Validate the request (no decision on failure)
    /// 2. Enrich the context through the attribute resolver
    /// 3. Load policies from the store
    /// 4. Run the deny-override scan
    /// 5. Record metrics
    ///
    /// Steps 2-4 share the `max_evaluation_time` budget. Collaborator failures and
    /// timeouts propagate as errors.
    pub async fn evaluate(&self, request: &EvaluationRequest) -> Result<Decision> {
        let start = Instant::now();
        request.validate()?;

        debug!(
            "Evaluation request: subject={}, resource={}, action={}",
            request.subject_id, request.resource_id, request.action
        );

        let budget = self.config.max_evaluation_time();
        let outcome = tokio::time::timeout(budget, self.evaluate_within_budget(request)).await;

        let verdict = match outcome {
            Ok(Ok(verdict)) => verdict,
            Ok(Err(e)) => {
                warn!("Evaluation failed for subject {}: {}", request.subject_id, e);
                if let Some(metrics) = &self.metrics {
                    metrics.record_error().await;
                }
                return Err(e);
            }
            Err(_) => {
                warn!(
                    "Evaluation for subject {} exceeded {}ms",
                    request.subject_id, self.config.max_evaluation_time_ms
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_timeout().await;
                }
                return Err(AuthzError::Timeout(self.config.max_evaluation_time_ms));
            }
        };

        let elapsed = start.elapsed();
        let decision = verdict.decision.with_evaluation_time(elapsed);

        if let Some(metrics) = &self.metrics {
            if verdict.rejected_policy {
                metrics.record_rejected_policy().await;
            }
            metrics.record_decision(&decision, elapsed).await;
        }

        Ok(decision)
    }

    /// Decide an action on a resource against `policies` in an already-built context
    pub fn decide(
        &self,
        action: &str,
        resource: &str,
        policies: &[Policy],
        ctx: &EvaluationContext,
    ) -> Decision {
        self.scan(action, resource, policies, ctx).decision
    }

    /// Metrics collector, when enabled
    pub fn metrics(&self) -> Option<&Arc<MetricsCollector>> {
        self.metrics.as_ref()
    }

    /// Prometheus exposition of decision and regex cache metrics
    pub async fn export_metrics(&self) -> Option<String> {
        match &self.metrics {
            Some(metrics) => Some(metrics.export_prometheus(&self.regex_cache.stats()).await),
            None => None,
        }
    }

    /// Shared regex cache
    pub fn regex_cache(&self) -> &Arc<RegexCache> {
        &self.regex_cache
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn evaluate_within_budget(&self, request: &EvaluationRequest) -> Result<Verdict> {
        let attributes = self
            .attributes
            .as_ref()
            .ok_or_else(|| AuthzError::Internal("no attribute resolver configured".to_string()))?;
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| AuthzError::Internal("no policy store configured".to_string()))?;

        let ctx = attributes.enrich_context(request).await?;
        let policies = store.get_policies().await?;

        debug!("Loaded {} policies", policies.len());

        Ok(self.scan(&request.action, &request.resource_id, &policies, &ctx))
    }

    fn scan(&self, action: &str, resource: &str, policies: &[Policy], ctx: &EvaluationContext) -> Verdict {
        let start = Instant::now();
        let enabled: Vec<&Policy> = policies.iter().filter(|p| p.enabled).collect();

        for policy in &enabled {
            if let Err(violation) = self.limits.check(policy) {
                warn!("Rejecting policy '{}': {}", policy.id, violation);
                let decision = Decision::deny(vec![], format!("Policy {} rejected: {}", policy.id, violation));
                return Verdict {
                    decision: decision.with_evaluation_time(start.elapsed()),
                    rejected_policy: true,
                };
            }
        }

        let mut matched = Vec::new();
        for policy in enabled {
            for statement in &policy.statement {
                if !self.statement_applies(statement, action, resource, ctx) {
                    continue;
                }

                debug!("Statement '{}' of policy '{}' matched ({})", statement.sid, policy.id, statement.effect);
                matched.push(StatementMatch::new(policy.id.clone(), statement.sid.clone()));

                if statement.effect == Effect::Deny {
                    info!("Decision: DENY by statement '{}' of policy '{}'", statement.sid, policy.id);
                    let decision = Decision::deny(matched, format!("Denied by statement: {}", statement.sid));
                    return Verdict {
                        decision: decision.with_evaluation_time(start.elapsed()),
                        rejected_policy: false,
                    };
                }
            }
        }

        let decision = if matched.is_empty() {
            info!("Decision: DENY (no matching statements) for action {} on {}", action, resource);
            Decision::deny(matched, IMPLICIT_DENY_REASON)
        } else {
            let sids: Vec<&str> = matched.iter().map(|m| m.sid.as_str()).collect();
            let reason = format!("Allowed by statements: {}", sids.join(", "));
            info!("Decision: PERMIT by {} statement(s) for action {} on {}", matched.len(), action, resource);
            Decision::permit(matched, reason)
        };

        Verdict {
            decision: decision.with_evaluation_time(start.elapsed()),
            rejected_policy: false,
        }
    }

    fn statement_applies(&self, statement: &Statement, action: &str, resource: &str, ctx: &EvaluationContext) -> bool {
        if !self.actions.matches_any(statement.action.iter(), action) {
            debug!("Statement '{}' skipped: action {} not matched", statement.sid, action);
            return false;
        }

        if !self.resources.matches_any(statement.resource.iter(), resource, ctx) {
            debug!("Statement '{}' skipped: resource {} not matched", statement.sid, resource);
            return false;
        }

        if let Some(excluded) = &statement.not_resource {
            if self.resources.matches_any(excluded.iter(), resource, ctx) {
                debug!("Statement '{}' skipped: resource {} excluded by NotResource", statement.sid, resource);
                return false;
            }
        }

        match &statement.condition {
            Some(condition) if !self.evaluator.evaluate_condition(condition, ctx) => {
                debug!("Statement '{}' skipped: condition not satisfied", statement.sid);
                false
            }
            _ => true,
        }
    }
}

impl Default for PolicyDecisionPoint {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Namespace;
    use crate::types::DecisionResult;
    use serde_json::json;

    fn engineer(on_probation: bool) -> EvaluationContext {
        EvaluationContext::new()
            .with(Namespace::User, "department", "engineering")
            .with(Namespace::User, "on_probation", on_probation)
    }

    fn allow_read() -> Statement {
        Statement::new("AllowEngineeringRead", Effect::Allow, "document-service:file:read", "api:documents:*")
            .with_condition(json!({ "StringEquals": { "user.department": "engineering" } }))
    }

    fn deny_probation() -> Statement {
        Statement::new("DenyProbation", Effect::Deny, "document-service:file:*", "api:documents:*")
            .with_condition(json!({ "Bool": { "user.on_probation": true } }))
    }

    #[test]
    fn test_permit_reason_lists_sids() {
        let pdp = PolicyDecisionPoint::default();
        let also = Statement::new("AlsoAllow", Effect::Allow, "*", "*");
        let policies = vec![Policy::new("docs", vec![allow_read(), also])];

        let decision = pdp.decide("document-service:file:read", "api:documents:doc-1", &policies, &engineer(false));
        assert_eq!(decision.result, DecisionResult::Permit);
        assert_eq!(decision.reason, "Allowed by statements: AllowEngineeringRead, AlsoAllow");
        assert_eq!(decision.matched_policies.len(), 2);
    }

    #[test]
    fn test_deny_stops_scan() {
        let pdp = PolicyDecisionPoint::default();
        let policies = vec![
            Policy::new("docs", vec![allow_read(), deny_probation()]),
            Policy::new("later", vec![Statement::new("Never", Effect::Allow, "*", "*")]),
        ];

        let decision = pdp.decide("document-service:file:read", "api:documents:doc-1", &policies, &engineer(true));
        assert_eq!(decision.result, DecisionResult::Deny);
        assert_eq!(decision.reason, "Denied by statement: DenyProbation");
        assert_eq!(
            decision.matched_policies,
            vec![
                StatementMatch::new("docs", "AllowEngineeringRead"),
                StatementMatch::new("docs", "DenyProbation"),
            ]
        );
    }

    #[test]
    fn test_disabled_policies_are_skipped() {
        let pdp = PolicyDecisionPoint::default();
        let policies = vec![
            Policy::new("deny-all", vec![Statement::new("DenyAll", Effect::Deny, "*", "*")]).disabled(),
            Policy::new("docs", vec![allow_read()]),
        ];

        let decision = pdp.decide("document-service:file:read", "api:documents:doc-1", &policies, &engineer(false));
        assert!(decision.is_permitted());
    }

    #[test]
    fn test_not_resource_excludes_statement() {
        let pdp = PolicyDecisionPoint::default();
        let statement = Statement::new("AllowDocs", Effect::Allow, "*", "api:documents:*")
            .with_not_resource("api:documents:secret-*");
        let policies = vec![Policy::new("docs", vec![statement])];
        let ctx = EvaluationContext::new();

        assert!(pdp.decide("a:b:c", "api:documents:doc-1", &policies, &ctx).is_permitted());
        let decision = pdp.decide("a:b:c", "api:documents:secret-plans", &policies, &ctx);
        assert!(!decision.is_permitted());
        assert_eq!(decision.reason, IMPLICIT_DENY_REASON);
    }

    #[test]
    fn test_over_limit_policy_denies() {
        let config = EngineConfig {
            max_condition_keys: 1,
            ..EngineConfig::default()
        };
        let pdp = PolicyDecisionPoint::new(config);
        let wide = Statement::new("Wide", Effect::Allow, "*", "*")
            .with_condition(json!({ "StringEquals": { "a": "1", "b": "2" } }));
        let policies = vec![
            Policy::new("docs", vec![allow_read()]),
            Policy::new("wide", vec![wide]),
        ];

        let decision = pdp.decide("document-service:file:read", "api:documents:doc-1", &policies, &engineer(false));
        assert_eq!(decision.result, DecisionResult::Deny);
        assert!(decision.matched_policies.is_empty());
        assert_eq!(decision.reason, "Policy wide rejected: 2 condition keys exceed limit 1");
    }

    #[test]
    fn test_over_limit_disabled_policy_is_ignored() {
        let config = EngineConfig {
            max_condition_depth: 1,
            ..EngineConfig::default()
        };
        let pdp = PolicyDecisionPoint::new(config);
        let deep = Statement::new("Deep", Effect::Allow, "*", "*")
            .with_condition(json!({ "Not": { "Not": { "Bool": { "x": true } } } }));
        let policies = vec![
            Policy::new("deep", vec![deep]).disabled(),
            Policy::new("open", vec![Statement::new("Open", Effect::Allow, "*", "*")]),
        ];

        assert!(pdp
            .decide("a:b:c", "x:y:z", &policies, &EvaluationContext::new())
            .is_permitted());
    }

    #[tokio::test]
    async fn test_evaluate_requires_collaborators() {
        let pdp = PolicyDecisionPoint::default();
        let request = EvaluationRequest::new("alice", "api:documents:doc-1", "document-service:file:read");
        assert!(matches!(pdp.evaluate(&request).await, Err(AuthzError::Internal(_))));
    }

    #[tokio::test]
    async fn test_evaluate_rejects_invalid_request() {
        let pdp = PolicyDecisionPoint::default();
        let request = EvaluationRequest::new("alice", "", "document-service:file:read");
        assert!(matches!(pdp.evaluate(&request).await, Err(AuthzError::InvalidRequest(_))));
    }
}
