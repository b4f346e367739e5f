//! Error types for the policy decision point

use thiserror::Error;

/// Policy decision point errors
///
/// Only request validation and collaborator failures surface here. Problems inside
/// policy logic (unknown operators, missing attributes, malformed resources) never
/// become errors; they make the offending predicate evaluate to `false`.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Incoming request is missing mandatory fields
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Policy not found
    #[error("Policy not found: {0}")]
    PolicyNotFound(String),

    /// Invalid policy document
    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    /// Subject record could not be resolved
    #[error("Subject not found: {0}")]
    SubjectNotFound(String),

    /// Resource record could not be resolved
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// Policy storage failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Context enrichment failure
    #[error("Context enrichment failed: {0}")]
    Enrichment(String),

    /// Evaluation exceeded the configured deadline
    #[error("Evaluation timed out after {0}ms")]
    Timeout(u64),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for policy decision point operations
pub type Result<T> = std::result::Result<T, AuthzError>;
