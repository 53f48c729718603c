//! Error types for the template macro and rotation engines

use thiserror::Error;

/// Failures raised by the external collaborators (parameter store, object
/// store, stack service). All of them abort the current invocation.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Parameter store lookup failed for path '{path}': {reason}")]
    ParameterStore { path: String, reason: String },

    #[error("Object store fetch failed for '{key}': {reason}")]
    ObjectStore { key: String, reason: String },

    #[error("Object '{key}' is not valid JSON: {source}")]
    InvalidJson {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Template lookup failed for stack '{stack}': {reason}")]
    StackTemplate { stack: String, reason: String },
}

impl SourceError {
    pub fn parameter_store(path: &str, reason: impl ToString) -> Self {
        Self::ParameterStore {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn object_store(key: &str, reason: impl ToString) -> Self {
        Self::ObjectStore {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn stack_template(stack: &str, reason: impl ToString) -> Self {
        Self::StackTemplate {
            stack: stack.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Fatal macro errors. Unresolved tokens are not errors; they are reported
/// through [`crate::Outcome::ValidationFailed`].
#[derive(Debug, Error)]
pub enum MacroError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Failed to serialize fragment for validation: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum RotationError {
    #[error("Template has no 'Resources' object")]
    MissingResources,

    #[error("Deployment resource '{0}' is not keyed by a numeric stage id")]
    InvalidStageId(String),

    #[error("Stage ceiling must be at least 1")]
    ZeroCeiling,
}
