//! # CretoAI ABAC Policy Decision Point
//!
//! Attribute-based authorization over IAM-style policy documents.
//!
//! ## Features
//!
//! - **Deny-override combining**: any matching Deny statement wins
//! - **Typed condition trees** parsed once from JSON, failing closed on bad input
//! - **String, numeric, boolean, date/time, array and network operators**
//! - **Action/resource wildcards** with `${namespace:key}` variable substitution
//! - **Flexible attribute paths** (`user:department`, `user.department`, `user.roles[0]`)
//! - **Shared compiled-regex cache** injected into every matcher
//! - **Async collaborators** for policy storage and attribute enrichment
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use cretoai_abac::{
//!     EngineConfig, EvaluationRequest, InMemoryAttributeResolver, InMemoryPolicyStore,
//!     Policy, PolicyDecisionPoint, ResourceRecord, SubjectRecord,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let policy = Policy::from_json(r#"{
//!         "Version": "2024-01-01",
//!         "Id": "engineering-docs",
//!         "Statement": [{
//!             "Sid": "AllowEngineeringRead",
//!             "Effect": "Allow",
//!             "Action": "document-service:file:read",
//!             "Resource": "api:documents:*",
//!             "Condition": { "StringEquals": { "user.department": "engineering" } }
//!         }]
//!     }"#)?;
//!
//!     let attributes = InMemoryAttributeResolver::new()
//!         .with_subject(SubjectRecord::new("alice").with_attribute("department", "engineering"))
//!         .with_resource(ResourceRecord::new("api:documents:doc-1", "document"));
//!
//!     let pdp = PolicyDecisionPoint::new(EngineConfig::default())
//!         .with_policy_store(Arc::new(InMemoryPolicyStore::with_policies(vec![policy])))
//!         .with_attribute_resolver(Arc::new(attributes));
//!
//!     let request = EvaluationRequest::new("alice", "api:documents:doc-1", "document-service:file:read");
//!     let decision = pdp.evaluate(&request).await?;
//!
//!     assert!(decision.is_permitted());
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod condition;
pub mod config;
pub mod context;
pub mod engine;
pub mod enrichment;
pub mod error;
pub mod matcher;
pub mod policy;
pub mod types;

// Re-export commonly used types
pub use cache::{CacheStats, RegexCache};
pub use condition::{Condition, ConditionEvaluator, ConditionNode, Operator};
pub use config::EngineConfig;
pub use context::{EvaluationContext, Namespace, PathResolver};
pub use engine::{MetricsCollector, PolicyDecisionPoint};
pub use enrichment::{AttributeResolver, InMemoryAttributeResolver, ResourceRecord, SubjectRecord};
pub use error::{AuthzError, Result};
pub use matcher::{ActionMatcher, ResourceMatcher};
pub use policy::{Effect, InMemoryPolicyStore, PatternList, Policy, PolicyStore, Statement};
pub use types::{Decision, DecisionResult, EnvironmentInfo, EvaluationRequest, PolicyId, StatementMatch};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
