//! Context enrichment: subject and resource attribute lookup

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::context::EvaluationContext;
use crate::error::{AuthzError, Result};
use crate::types::EvaluationRequest;

/// Builds the evaluation context for a request
#[async_trait]
pub trait AttributeResolver: Send + Sync {
    /// Resolve subject and resource attributes and merge request-time environment
    async fn enrich_context(&self, request: &EvaluationRequest) -> Result<EvaluationContext>;
}

/// Subject (user, service account, agent) and its attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectRecord {
    pub id: String,
    #[serde(rename = "type", default = "default_subject_type")]
    pub subject_type: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

fn default_subject_type() -> String {
    "user".to_string()
}

impl SubjectRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subject_type: default_subject_type(),
            attributes: Map::new(),
        }
    }

    pub fn with_type(mut self, subject_type: impl Into<String>) -> Self {
        self.subject_type = subject_type.into();
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Resource and its attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub id: String,
    #[serde(rename = "type", default)]
    pub resource_type: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl ResourceRecord {
    pub fn new(id: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resource_type: resource_type.into(),
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Attribute resolver over registered in-memory records
///
/// Record attributes are applied after caller-supplied context, so a request
/// cannot override a stored subject or resource attribute.
#[derive(Debug, Default)]
pub struct InMemoryAttributeResolver {
    subjects: DashMap<String, SubjectRecord>,
    resources: DashMap<String, ResourceRecord>,
}

impl InMemoryAttributeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a subject
    pub fn insert_subject(&self, subject: SubjectRecord) {
        self.subjects.insert(subject.id.clone(), subject);
    }

    /// Register (or replace) a resource
    pub fn insert_resource(&self, resource: ResourceRecord) {
        self.resources.insert(resource.id.clone(), resource);
    }

    /// Builder-style [`insert_subject`](Self::insert_subject)
    pub fn with_subject(self, subject: SubjectRecord) -> Self {
        self.insert_subject(subject);
        self
    }

    /// Builder-style [`insert_resource`](Self::insert_resource)
    pub fn with_resource(self, resource: ResourceRecord) -> Self {
        self.insert_resource(resource);
        self
    }
}

#[async_trait]
impl AttributeResolver for InMemoryAttributeResolver {
    async fn enrich_context(&self, request: &EvaluationRequest) -> Result<EvaluationContext> {
        let subject = self
            .subjects
            .get(&request.subject_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AuthzError::SubjectNotFound(request.subject_id.clone()))?;

        let resource = self
            .resources
            .get(&request.resource_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AuthzError::ResourceNotFound(request.resource_id.clone()))?;

        debug!(
            "Enriching context for subject {} ({} attributes) on resource {} ({} attributes)",
            subject.id,
            subject.attributes.len(),
            resource.id,
            resource.attributes.len()
        );

        Ok(EvaluationContext::for_request(request)
            .with_subject(subject.id, subject.subject_type, &subject.attributes)
            .with_resource(resource.id, resource.resource_type, &resource.attributes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EnvironmentInfo;
    use serde_json::json;

    fn resolver() -> InMemoryAttributeResolver {
        InMemoryAttributeResolver::new()
            .with_subject(SubjectRecord::new("alice").with_attribute("department", "engineering"))
            .with_resource(ResourceRecord::new("api:documents:doc-1", "document").with_attribute("owner", "alice"))
    }

    #[tokio::test]
    async fn test_enrich_context() {
        let request = EvaluationRequest::new("alice", "api:documents:doc-1", "document-service:file:read")
            .with_environment(EnvironmentInfo {
                client_ip: Some("10.0.0.7".to_string()),
                ..Default::default()
            });

        let ctx = resolver().enrich_context(&request).await.unwrap();
        assert_eq!(ctx.flat("user:department"), Some(&json!("engineering")));
        assert_eq!(ctx.flat("resource:owner"), Some(&json!("alice")));
        assert_eq!(ctx.flat("resource:type"), Some(&json!("document")));
        assert_eq!(ctx.flat("environment:client_ip"), Some(&json!("10.0.0.7")));
        assert_eq!(ctx.action(), Some("document-service:file:read"));
    }

    #[tokio::test]
    async fn test_records_override_caller_context() {
        let request = EvaluationRequest::new("alice", "api:documents:doc-1", "document-service:file:read")
            .with_context("user:department", json!("finance"));

        let ctx = resolver().enrich_context(&request).await.unwrap();
        assert_eq!(ctx.flat("user:department"), Some(&json!("engineering")));
    }

    #[tokio::test]
    async fn test_subject_type() {
        let resolver = resolver().with_subject(SubjectRecord::new("ci-bot").with_type("service"));
        let request = EvaluationRequest::new("ci-bot", "api:documents:doc-1", "document-service:file:read");

        let ctx = resolver.enrich_context(&request).await.unwrap();
        assert_eq!(ctx.flat("user:type"), Some(&json!("service")));
        assert_eq!(ctx.flat("user:id"), Some(&json!("ci-bot")));
    }

    #[tokio::test]
    async fn test_unknown_records() {
        let resolver = resolver();

        let request = EvaluationRequest::new("mallory", "api:documents:doc-1", "document-service:file:read");
        assert!(matches!(
            resolver.enrich_context(&request).await,
            Err(AuthzError::SubjectNotFound(id)) if id == "mallory"
        ));

        let request = EvaluationRequest::new("alice", "api:documents:missing", "document-service:file:read");
        assert!(matches!(
            resolver.enrich_context(&request).await,
            Err(AuthzError::ResourceNotFound(_))
        ));
    }
}
