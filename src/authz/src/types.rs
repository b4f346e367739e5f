//! Core request and decision types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{AuthzError, Result};

/// Unique policy identifier
pub type PolicyId = String;

/// Request-time environment information supplied by the enforcement point
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    /// Client IP address as seen by the enforcement point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,

    /// Raw user agent string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Additional environment attributes (geo, device, ...)
    #[serde(default)]
    pub custom_attributes: Map<String, Value>,
}

/// Authorization request handed to the decision point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    /// Who is making the request
    pub subject_id: String,

    /// What resource is being accessed (e.g., "api:documents:doc-1")
    pub resource_id: String,

    /// What action is being performed (e.g., "document-service:file:read")
    pub action: String,

    /// Explicit evaluation time; defaults to now
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    /// Request-time environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<EnvironmentInfo>,

    /// Free-form caller context
    #[serde(default)]
    pub context: Map<String, Value>,
}

impl EvaluationRequest {
    /// Create a request for subject, resource and action
    pub fn new(
        subject_id: impl Into<String>,
        resource_id: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            resource_id: resource_id.into(),
            action: action.into(),
            timestamp: None,
            environment: None,
            context: Map::new(),
        }
    }

    /// Pin the evaluation time
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Attach environment information
    pub fn with_environment(mut self, environment: EnvironmentInfo) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Add a caller context entry
    pub fn with_context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    /// Reject requests missing subject, resource or action
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("subject_id", &self.subject_id),
            ("resource_id", &self.resource_id),
            ("action", &self.action),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AuthzError::InvalidRequest(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )))
        }
    }
}

/// Final decision outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionResult {
    /// Access granted
    Permit,
    /// Access denied (explicitly or implicitly)
    Deny,
}

impl fmt::Display for DecisionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permit => f.write_str("permit"),
            Self::Deny => f.write_str("deny"),
        }
    }
}

/// A statement that matched during evaluation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatementMatch {
    /// Owning policy
    pub policy_id: PolicyId,

    /// Statement identifier
    pub sid: String,
}

impl StatementMatch {
    pub fn new(policy_id: impl Into<String>, sid: impl Into<String>) -> Self {
        Self {
            policy_id: policy_id.into(),
            sid: sid.into(),
        }
    }
}

/// Authorization decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Unique decision identifier
    pub id: String,

    /// Permit or deny
    pub result: DecisionResult,

    /// Statements that matched, in evaluation order
    pub matched_policies: Vec<StatementMatch>,

    /// Human-readable reason
    pub reason: String,

    /// Time spent evaluating
    pub evaluation_time_ms: u64,

    /// Decision timestamp (milliseconds since epoch)
    pub timestamp: u64,
}

impl Decision {
    /// Create a new decision
    pub fn new(result: DecisionResult, matched: Vec<StatementMatch>, reason: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            result,
            matched_policies: matched,
            reason: reason.into(),
            evaluation_time_ms: 0,
            timestamp: u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default(),
        }
    }

    /// Permit decision
    pub fn permit(matched: Vec<StatementMatch>, reason: impl Into<String>) -> Self {
        Self::new(DecisionResult::Permit, matched, reason)
    }

    /// Deny decision
    pub fn deny(matched: Vec<StatementMatch>, reason: impl Into<String>) -> Self {
        Self::new(DecisionResult::Deny, matched, reason)
    }

    /// Record how long evaluation took
    pub fn with_evaluation_time(mut self, elapsed: Duration) -> Self {
        self.evaluation_time_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Whether access is granted
    pub fn is_permitted(&self) -> bool {
        self.result == DecisionResult::Permit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_validation() {
        assert!(EvaluationRequest::new("alice", "api:docs:1", "svc:file:read").validate().is_ok());

        let err = EvaluationRequest::new("", "api:docs:1", " ").validate().unwrap_err();
        match err {
            AuthzError::InvalidRequest(msg) => {
                assert!(msg.contains("subject_id"));
                assert!(msg.contains("action"));
                assert!(!msg.contains("resource_id"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_decision_creation() {
        let decision = Decision::permit(
            vec![StatementMatch::new("policy-1", "AllowRead")],
            "Allowed by statements: AllowRead",
        );
        assert!(decision.is_permitted());
        assert!(!decision.id.is_empty());

        let deny = Decision::deny(vec![], "No matching policies found (implicit deny)");
        assert!(!deny.is_permitted());
        assert!(deny.matched_policies.is_empty());
    }

    #[test]
    fn test_decision_serialization_shape() {
        let decision = Decision::deny(vec![StatementMatch::new("p", "s")], "Denied by statement: s")
            .with_evaluation_time(Duration::from_millis(3));
        let value = serde_json::to_value(&decision).unwrap();

        assert_eq!(value["result"], json!("deny"));
        assert_eq!(value["matched_policies"][0]["sid"], json!("s"));
        assert_eq!(value["evaluation_time_ms"], json!(3));
    }
}
