//! Property tests for the decision algorithm, matchers and path resolution

use cretoai_abac::context::{substitute_pattern, substitute_value};
use cretoai_abac::{
    ActionMatcher, ConditionEvaluator, DecisionResult, Effect, EngineConfig, EvaluationContext,
    InMemoryAttributeResolver, InMemoryPolicyStore, Namespace, PathResolver, Policy, PolicyDecisionPoint,
    ResourceMatcher, ResourceRecord, Statement, SubjectRecord, EvaluationRequest,
};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;

const ACTION: &str = "svc:file:read";
const RESOURCE: &str = "api:documents:doc-1";

/// (effect is Deny, statement matches the request)
fn statement_strategy() -> impl Strategy<Value = (bool, bool)> {
    (any::<bool>(), any::<bool>())
}

fn build_statement(index: usize, deny: bool, matches: bool) -> Statement {
    let effect = if deny { Effect::Deny } else { Effect::Allow };
    let action = if matches { "svc:file:*" } else { "other:file:read" };
    Statement::new(format!("s{index}"), effect, action, "api:documents:*")
}

fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,7}"
}

// ============================================================================
// DENY-OVERRIDE PROPERTIES
// ============================================================================

proptest! {
    #[test]
    fn test_deny_dominance(
        specs in prop::collection::vec(statement_strategy(), 0..12),
        split in 0usize..4,
    ) {
        let pdp = PolicyDecisionPoint::new(EngineConfig { enable_metrics: false, ..EngineConfig::default() });
        let statements: Vec<Statement> = specs
            .iter()
            .enumerate()
            .map(|(i, (deny, matches))| build_statement(i, *deny, *matches))
            .collect();

        // Spread statements over several policies to exercise the outer loop too
        let chunk = statements.len() / (split + 1) + 1;
        let policies: Vec<Policy> = statements
            .chunks(chunk)
            .enumerate()
            .map(|(i, chunk)| Policy::new(format!("p{i}"), chunk.to_vec()))
            .collect();

        let decision = pdp.decide(ACTION, RESOURCE, &policies, &EvaluationContext::new());

        let any_deny = specs.iter().any(|(deny, matches)| *deny && *matches);
        let any_allow = specs.iter().any(|(deny, matches)| !*deny && *matches);

        if any_deny {
            prop_assert_eq!(decision.result, DecisionResult::Deny);
            prop_assert!(decision.reason.starts_with("Denied by statement: "));
        } else if any_allow {
            prop_assert_eq!(decision.result, DecisionResult::Permit);
            prop_assert!(decision.reason.starts_with("Allowed by statements: "));
        } else {
            prop_assert_eq!(decision.result, DecisionResult::Deny);
            prop_assert!(decision.matched_policies.is_empty());
        }

        // Reversing the scan order may change the reason, never the result
        let mut reversed = policies.clone();
        reversed.reverse();
        for policy in &mut reversed {
            policy.statement.reverse();
        }
        let reversed_decision = pdp.decide(ACTION, RESOURCE, &reversed, &EvaluationContext::new());
        prop_assert_eq!(reversed_decision.result, decision.result);
    }

    #[test]
    fn test_decision_determinism_through_evaluate(
        department in "(engineering|sales|legal)",
        on_probation in any::<bool>(),
    ) {
        tokio_test::block_on(async {
            let policy = Policy::new("docs", vec![
                Statement::new("AllowEngineering", Effect::Allow, "svc:file:*", "api:documents:*")
                    .with_condition(json!({ "StringEquals": { "user.department": "engineering" } })),
                Statement::new("DenyProbation", Effect::Deny, "*", "*")
                    .with_condition(json!({ "Bool": { "user.on_probation": true } })),
            ]);
            let attributes = InMemoryAttributeResolver::new()
                .with_subject(
                    SubjectRecord::new("alice")
                        .with_attribute("department", department.as_str())
                        .with_attribute("on_probation", on_probation),
                )
                .with_resource(ResourceRecord::new(RESOURCE, "document"));
            let pdp = PolicyDecisionPoint::new(EngineConfig::default())
                .with_policy_store(Arc::new(InMemoryPolicyStore::with_policies(vec![policy])))
                .with_attribute_resolver(Arc::new(attributes));

            let request = EvaluationRequest::new("alice", RESOURCE, ACTION);
            let first = pdp.evaluate(&request).await.unwrap();
            let second = pdp.evaluate(&request).await.unwrap();

            assert_eq!(first.result, second.result);
            assert_eq!(first.reason, second.reason);
            assert_eq!(first.is_permitted(), department == "engineering" && !on_probation);
        });
    }
}

// ============================================================================
// WILDCARD LAWS
// ============================================================================

proptest! {
    #[test]
    fn test_wildcard_segment_law(a in segment(), b in segment(), c in segment(), d in segment()) {
        prop_assume!(c != d);
        let matcher = ActionMatcher::default();
        let action = format!("{a}:{b}:{c}");

        let trailing = format!("{a}:{b}:*");
        let leading = format!("*:{b}:{c}");
        let mismatched = format!("{a}:{b}:{d}");
        prop_assert!(matcher.matches(&trailing, &action));
        prop_assert!(matcher.matches(&leading, &action));
        prop_assert!(matcher.matches("*", &action));
        prop_assert!(!matcher.matches(&mismatched, &action));
    }

    #[test]
    fn test_trailing_wildcard_law(a in segment(), rest in prop::collection::vec(segment(), 0..5)) {
        let matcher = ActionMatcher::default();
        let mut segments = vec![a.clone()];
        segments.extend(rest);

        let pattern = format!("{a}:*");
        prop_assert!(matcher.matches(&pattern, &segments.join(":")));
    }

    #[test]
    fn test_resource_matches_itself(a in segment(), b in segment(), c in segment()) {
        let matcher = ResourceMatcher::default();
        let resource = format!("{a}:{b}:{c}");
        prop_assert!(matcher.matches(&resource, &resource, &EvaluationContext::new()));
    }
}

// ============================================================================
// RESOLUTION AND SUBSTITUTION PROPERTIES
// ============================================================================

proptest! {
    #[test]
    fn test_direct_key_beats_nested(direct in "[A-Za-z]{1,10}", nested in "[A-Za-z]{1,10}") {
        let ctx: EvaluationContext = json!({
            "user.department": direct.clone(),
            "user": { "department": nested }
        })
        .as_object()
        .cloned()
        .unwrap_or_default()
        .into();

        prop_assert_eq!(PathResolver::new().resolve("user.department", &ctx), Some(&Value::String(direct)));
    }

    #[test]
    fn test_substitution_without_placeholders_is_identity(text in "[a-zA-Z0-9:*/._ {}$-]{0,40}") {
        prop_assume!(!text.contains("${"));
        let ctx = EvaluationContext::new().with(Namespace::Request, "UserId", "u-1");

        prop_assert_eq!(substitute_pattern(&text, &ctx), text.clone());
        prop_assert_eq!(substitute_value(&Value::String(text.clone()), &ctx), Value::String(text));
    }

    #[test]
    fn test_empty_condition_is_vacuous(
        keys in prop::collection::btree_map("[a-z]{1,8}", "[a-z0-9]{0,8}", 0..6),
    ) {
        let mut ctx = EvaluationContext::new();
        for (key, value) in keys {
            ctx.set(Namespace::User, key, value);
        }
        let empty = json!({});
        prop_assert!(ConditionEvaluator::new().evaluate_conditions(&empty, &ctx));
    }
}
