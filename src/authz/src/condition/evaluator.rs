//! Condition evaluation
//!
//! Walks a [`ConditionNode`] tree against an [`EvaluationContext`]. Every leaf
//! resolves its path first; an absent (or `null`) actual value fails the leaf
//! before the operator runs, so conditions fail closed.

use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use super::node::{Condition, ConditionNode};
use super::operator::Operator;
use super::ops::temporal::BusinessHours;
use super::ops::{bool_equals, collection, network, numeric, string, temporal};
use crate::cache::RegexCache;
use crate::config::EngineConfig;
use crate::context::{EvaluationContext, PathResolver};

/// Evaluates condition blocks
#[derive(Debug, Clone)]
pub struct ConditionEvaluator {
    resolver: PathResolver,
    regex_cache: Arc<RegexCache>,
    business_hours: BusinessHours,
}

impl ConditionEvaluator {
    /// Create an evaluator with default shortcuts, business hours and its own regex cache
    pub fn new() -> Self {
        Self::with_components(PathResolver::new(), Arc::new(RegexCache::new()), BusinessHours::default())
    }

    /// Create an evaluator from explicit parts
    pub fn with_components(
        resolver: PathResolver,
        regex_cache: Arc<RegexCache>,
        business_hours: BusinessHours,
    ) -> Self {
        Self {
            resolver,
            regex_cache,
            business_hours,
        }
    }

    /// Create an evaluator from engine configuration, sharing `regex_cache`
    pub fn from_config(config: &EngineConfig, regex_cache: Arc<RegexCache>) -> Self {
        Self::with_components(
            PathResolver::with_shortcuts(config.shortcuts.iter().cloned()),
            regex_cache,
            config.business_hours.clone(),
        )
    }

    /// Regex cache used by `StringRegex` and `StringLike`
    pub fn regex_cache(&self) -> &Arc<RegexCache> {
        &self.regex_cache
    }

    /// Evaluate a raw JSON condition block
    ///
    /// An empty or `null` block is `true`.
    pub fn evaluate_conditions(&self, block: &Value, ctx: &EvaluationContext) -> bool {
        self.evaluate_condition(&Condition::parse(block.clone()), ctx)
    }

    /// Evaluate a parsed condition, substituting `${...}` variables first
    pub fn evaluate_condition(&self, condition: &Condition, ctx: &EvaluationContext) -> bool {
        if condition.has_variables() {
            let substituted = condition.root().substitute(ctx);
            self.evaluate(&substituted, ctx)
        } else {
            self.evaluate(condition.root(), ctx)
        }
    }

    /// Evaluate a (substituted) condition tree
    pub fn evaluate(&self, node: &ConditionNode, ctx: &EvaluationContext) -> bool {
        match node {
            ConditionNode::And(children) => children.iter().all(|child| self.evaluate(child, ctx)),
            ConditionNode::Or(children) => children.iter().any(|child| self.evaluate(child, ctx)),
            ConditionNode::Not(child) => !self.evaluate(child, ctx),
            ConditionNode::Unsatisfiable(reason) => {
                debug!("Unsatisfiable condition: {}", reason);
                false
            }
            ConditionNode::Leaf {
                operator,
                path,
                expected,
            } => self.evaluate_leaf(operator, path, expected, ctx),
        }
    }

    fn evaluate_leaf(&self, operator: &Operator, path: &str, expected: &Value, ctx: &EvaluationContext) -> bool {
        if let Operator::Unknown(name) = operator {
            debug!("Unknown condition operator '{}'", name);
            return false;
        }

        let Some(actual) = self.resolver.resolve(path, ctx).filter(|v| !v.is_null()) else {
            debug!("Condition path '{}' not found for {}", path, operator);
            return false;
        };

        self.apply(operator, actual, expected)
    }

    fn apply(&self, operator: &Operator, actual: &Value, expected: &Value) -> bool {
        let cache = self.regex_cache.as_ref();
        match operator {
            Operator::StringEquals => string::equals(actual, expected),
            Operator::StringNotEquals => string::not_equals(actual, expected),
            Operator::StringEqualsIgnoreCase => string::equals_ignore_case(actual, expected),
            Operator::StringLike => string::like(actual, expected, cache),
            Operator::StringContains => string::contains(actual, expected),
            Operator::StringStartsWith => string::starts_with(actual, expected),
            Operator::StringEndsWith => string::ends_with(actual, expected),
            Operator::StringRegex => string::regex(actual, expected, cache),

            Operator::NumericEquals => numeric::equals(actual, expected),
            Operator::NumericNotEquals => numeric::not_equals(actual, expected),
            Operator::NumericLessThan => numeric::compare(actual, expected, |a, e| a < e),
            Operator::NumericLessThanEquals => numeric::compare(actual, expected, |a, e| a <= e),
            Operator::NumericGreaterThan => numeric::compare(actual, expected, |a, e| a > e),
            Operator::NumericGreaterThanEquals => numeric::compare(actual, expected, |a, e| a >= e),
            Operator::NumericBetween => numeric::between(actual, expected),

            Operator::Bool => bool_equals(actual, expected),

            Operator::DateGreaterThan => temporal::after(actual, expected),
            Operator::DateLessThan => temporal::before(actual, expected),
            Operator::DateBetween => temporal::between(actual, expected),
            Operator::DayOfWeek => temporal::day_of_week(actual, expected),
            Operator::TimeOfDay => temporal::time_of_day(actual, expected),
            Operator::IsBusinessHours => temporal::is_business_hours(actual, expected, &self.business_hours),

            Operator::ArrayContains => collection::contains(actual, expected),
            Operator::ArrayNotContains => collection::not_contains(actual, expected),
            Operator::ArraySize => collection::size(actual, expected),

            Operator::IpInRange => network::in_any_range(actual, expected),
            Operator::IpNotInRange => network::outside_all_ranges(actual, expected),
            Operator::IsInternalIp => network::internal_equals(actual, expected),

            Operator::Unknown(_) => false,
        }
    }
}

impl Default for ConditionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}
