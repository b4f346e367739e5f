//! Condition size limits enforced before evaluation

use thiserror::Error;

use crate::config::EngineConfig;
use crate::policy::Policy;

/// Per-policy bounds on condition trees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionLimits {
    /// Deepest condition tree accepted in any statement
    pub max_depth: usize,
    /// Most operator leaves accepted across a policy's statements
    pub max_keys: usize,
}

impl ConditionLimits {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_depth: config.max_condition_depth,
            max_keys: config.max_condition_keys,
        }
    }

    /// Check one policy against the limits
    pub fn check(&self, policy: &Policy) -> Result<(), LimitViolation> {
        let conditions = policy
            .statement
            .iter()
            .filter_map(|statement| statement.condition.as_ref());

        let mut keys = 0;
        for condition in conditions {
            let depth = condition.root().depth();
            if depth > self.max_depth {
                return Err(LimitViolation::Depth {
                    depth,
                    max: self.max_depth,
                });
            }
            keys += condition.root().leaf_count();
        }

        if keys > self.max_keys {
            return Err(LimitViolation::Keys {
                keys,
                max: self.max_keys,
            });
        }
        Ok(())
    }
}

/// Reason a policy was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimitViolation {
    #[error("condition depth {depth} exceeds limit {max}")]
    Depth { depth: usize, max: usize },

    #[error("{keys} condition keys exceed limit {max}")]
    Keys { keys: usize, max: usize },
}
