//! Reconciliation error types
//!
//! Error definitions with transient/permanent classification. The core never
//! retries; the classification is surfaced so the orchestrator can decide.

use thiserror::Error;

use crate::state::ResourceState;

/// Error that can occur during reconciliation or lookup.
#[derive(Debug, Error)]
pub enum ReconcileError {
    // Local, pre-flight errors (never reach the remote API)
    /// An attribute or filter value failed validation.
    #[error("invalid value for '{attribute}': {message}")]
    Validation { attribute: String, message: String },

    /// The operation is not allowed in the current lifecycle state.
    #[error("cannot {operation} a resource in state {state}")]
    InvalidState {
        operation: &'static str,
        state: ResourceState,
    },

    // Remote outcomes
    /// The remote object does not exist, or a lookup matched nothing.
    #[error("{resource} not found: {detail}")]
    NotFound { resource: String, detail: String },

    /// A lookup matched more than one remote object.
    #[error(
        "more than one {resource} matched ({count} results); specify a more narrow filter"
    )]
    Ambiguous { resource: String, count: u64 },

    /// The remote API refused the request (non-404 4xx).
    #[error("remote rejected request (HTTP {status}): {detail}")]
    Rejected { status: u16, detail: String },

    /// Transport failure or 5xx from the remote API.
    #[error("remote unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A successful response could not be decoded into the declared types.
    #[error("invalid response from remote: {message}")]
    InvalidResponse { message: String },
}

impl ReconcileError {
    /// Check if this error is transient.
    ///
    /// Only transport failures and 5xx responses qualify; everything else
    /// requires a change of input or of remote state before a retry can help.
    pub fn is_transient(&self) -> bool {
        matches!(self, ReconcileError::Unavailable { .. })
    }

    /// Check if this error is permanent and retry won't help.
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Whether this is a remote "not found".
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReconcileError::NotFound { .. })
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            ReconcileError::Validation { .. } => "VALIDATION_ERROR",
            ReconcileError::InvalidState { .. } => "INVALID_STATE",
            ReconcileError::NotFound { .. } => "NOT_FOUND",
            ReconcileError::Ambiguous { .. } => "AMBIGUOUS",
            ReconcileError::Rejected { .. } => "REMOTE_REJECTED",
            ReconcileError::Unavailable { .. } => "REMOTE_UNAVAILABLE",
            ReconcileError::InvalidResponse { .. } => "INVALID_RESPONSE",
        }
    }

    // Convenience constructors

    /// Create a validation error.
    pub fn validation(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        ReconcileError::Validation {
            attribute: attribute.into(),
            message: message.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(resource: impl Into<String>, detail: impl Into<String>) -> Self {
        ReconcileError::NotFound {
            resource: resource.into(),
            detail: detail.into(),
        }
    }

    /// Create an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        ReconcileError::Unavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Create an unavailable error with source.
    pub fn unavailable_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ReconcileError::Unavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid-response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        ReconcileError::InvalidResponse {
            message: message.into(),
        }
    }
}

/// Result type for reconciliation operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;
