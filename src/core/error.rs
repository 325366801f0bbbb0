use super::lifecycle::ResourceState;
use thiserror::Error;

/// Errors surfaced by the classification service.
///
/// Validation and lookup errors are raised close to their cause; resource and
/// inference errors travel unchanged up to the HTTP layer, which is the only
/// place that turns them into status codes.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// The request was malformed or out of bounds. Never reaches the model.
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// The model is not `Ready`. Callers may retry after a backoff.
    #[error("model not loaded (state: {state})")]
    ResourceUnavailable { state: ResourceState },

    /// The model raised while classifying. Not retried.
    #[error("classification failed: {cause:#}")]
    InferenceFailure {
        #[source]
        cause: anyhow::Error,
    },

    /// A category id or name lookup missed.
    #[error("{kind} '{key}' not found")]
    NotFound { kind: &'static str, key: String },
}

impl ClassifierError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn inference(cause: impl Into<anyhow::Error>) -> Self {
        Self::InferenceFailure {
            cause: cause.into(),
        }
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::ResourceUnavailable { .. } => "resource_unavailable",
            Self::InferenceFailure { .. } => "inference_failure",
            Self::NotFound { .. } => "not_found",
        }
    }

    /// Whether retrying the same request later could succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::ResourceUnavailable { .. })
    }
}

pub type Result<T, E = ClassifierError> = std::result::Result<T, E>;
