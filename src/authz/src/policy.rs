//! Policy documents and storage
//!
//! Policies use the IAM-style document shape:
//!
//! ```json
//! {
//!   "Version": "2024-01-01",
//!   "Id": "engineering-docs",
//!   "Statement": [{
//!     "Sid": "AllowEngineeringRead",
//!     "Effect": "Allow",
//!     "Action": "document-service:file:read",
//!     "Resource": ["api:documents:*"],
//!     "Condition": { "StringEquals": { "user.department": "engineering" } }
//!   }]
//! }
//! ```

use crate::condition::Condition;
use crate::error::{AuthzError, Result};
use crate::types::PolicyId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Statement effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Effect {
    /// Grant the action
    Allow,
    /// Refuse the action
    Deny,
}

impl TryFrom<String> for Effect {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        if value.eq_ignore_ascii_case("allow") {
            Ok(Self::Allow)
        } else if value.eq_ignore_ascii_case("deny") {
            Ok(Self::Deny)
        } else {
            Err(format!("unknown effect '{value}', expected Allow or Deny"))
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "Allow"),
            Self::Deny => write!(f, "Deny"),
        }
    }
}

/// One pattern or a list of patterns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternList {
    One(String),
    Many(Vec<String>),
}

impl PatternList {
    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::One(pattern) => std::slice::from_ref(pattern),
            Self::Many(patterns) => patterns,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.as_slice().iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

impl From<&str> for PatternList {
    fn from(pattern: &str) -> Self {
        Self::One(pattern.to_string())
    }
}

impl From<String> for PatternList {
    fn from(pattern: String) -> Self {
        Self::One(pattern)
    }
}

impl From<Vec<String>> for PatternList {
    fn from(patterns: Vec<String>) -> Self {
        Self::Many(patterns)
    }
}

impl Default for PatternList {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

/// A single Allow/Deny rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    /// Statement identifier, reported in decisions
    #[serde(default)]
    pub sid: String,

    pub effect: Effect,

    /// Action patterns
    pub action: PatternList,

    /// Resource patterns
    pub resource: PatternList,

    /// Resources excluded even when `resource` matches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_resource: Option<PatternList>,

    /// Condition block; absent means unconditional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

impl Statement {
    /// Create an unconditional statement
    pub fn new(
        sid: impl Into<String>,
        effect: Effect,
        action: impl Into<PatternList>,
        resource: impl Into<PatternList>,
    ) -> Self {
        Self {
            sid: sid.into(),
            effect,
            action: action.into(),
            resource: resource.into(),
            not_resource: None,
            condition: None,
        }
    }

    /// Attach a condition block
    pub fn with_condition(mut self, condition: serde_json::Value) -> Self {
        self.condition = Some(Condition::parse(condition));
        self
    }

    /// Attach NotResource patterns
    pub fn with_not_resource(mut self, patterns: impl Into<PatternList>) -> Self {
        self.not_resource = Some(patterns.into());
        self
    }
}

/// Policy document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Policy {
    /// Document version
    #[serde(default)]
    pub version: String,

    /// Unique policy identifier
    pub id: PolicyId,

    /// Disabled policies are skipped entirely
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Statements, evaluated in order
    #[serde(default)]
    pub statement: Vec<Statement>,
}

fn default_enabled() -> bool {
    true
}

impl Policy {
    /// Create an enabled policy
    pub fn new(id: impl Into<String>, statements: Vec<Statement>) -> Self {
        Self {
            version: "2024-01-01".to_string(),
            id: id.into(),
            enabled: true,
            description: None,
            statement: statements,
        }
    }

    /// Parse a policy document
    pub fn from_json(json: &str) -> Result<Self> {
        let policy: Self = serde_json::from_str(json)?;
        if policy.id.trim().is_empty() {
            return Err(AuthzError::InvalidPolicy("policy Id must not be empty".to_string()));
        }
        if let Some(statement) = policy
            .statement
            .iter()
            .find(|s| s.action.is_empty() || s.resource.is_empty())
        {
            return Err(AuthzError::InvalidPolicy(format!(
                "statement '{}' needs at least one Action and Resource",
                statement.sid
            )));
        }
        Ok(policy)
    }

    /// Serialize to a pretty-printed policy document
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Builder: mark the policy disabled
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Policy store trait
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// All policies, in collection order (including disabled ones)
    async fn get_policies(&self) -> Result<Vec<Policy>>;

    /// Get a policy by ID
    async fn get(&self, id: &str) -> Result<Option<Policy>>;

    /// Store a policy, replacing any policy with the same ID in place
    async fn put(&self, policy: Policy) -> Result<()>;

    /// Delete a policy
    async fn delete(&self, id: &str) -> Result<()>;
}

/// In-memory policy store implementation
///
/// Keeps insertion order, which is the evaluation order.
pub struct InMemoryPolicyStore {
    policies: Arc<RwLock<Vec<Policy>>>,
}

impl InMemoryPolicyStore {
    /// Create a new in-memory policy store
    pub fn new() -> Self {
        Self {
            policies: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Create a store holding `policies`
    pub fn with_policies(policies: Vec<Policy>) -> Self {
        Self {
            policies: Arc::new(RwLock::new(policies)),
        }
    }
}

impl Default for InMemoryPolicyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PolicyStore for InMemoryPolicyStore {
    async fn get_policies(&self) -> Result<Vec<Policy>> {
        let policies = self.policies.read().await;
        Ok(policies.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<Policy>> {
        let policies = self.policies.read().await;
        Ok(policies.iter().find(|p| p.id == id).cloned())
    }

    async fn put(&self, policy: Policy) -> Result<()> {
        let mut policies = self.policies.write().await;
        match policies.iter_mut().find(|p| p.id == policy.id) {
            Some(existing) => *existing = policy,
            None => policies.push(policy),
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut policies = self.policies.write().await;
        let before = policies.len();
        policies.retain(|p| p.id != id);
        if policies.len() == before {
            return Err(AuthzError::PolicyNotFound(id.to_string()));
        }
        Ok(())
    }
}
