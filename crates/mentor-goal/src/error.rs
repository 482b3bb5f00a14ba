// error.rs — Error types for goal and step operations.

use mentor_gateway::{GatewayError, SuggestionError};
use thiserror::Error;
use uuid::Uuid;

/// Errors from goal store operations.
///
/// `Clone` so the store can keep the last failure in its state. The Display
/// text is the message shown to the user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GoalError {
    /// No signed-in user, or the backend refused the session.
    #[error("User is not authenticated")]
    Unauthenticated,

    #[error("not found: {0}")]
    NotFound(String),

    /// Rejected by a local check or a backend constraint.
    #[error("{0}")]
    ValidationRejected(String),

    #[error("network error: {0}")]
    TransportFailure(String),

    /// No suggestion credential is configured.
    #[error("AI step suggestions are not available")]
    SuggestionUnavailable,

    #[error("failed to generate steps: {0}")]
    SuggestionFailed(String),

    /// A single-step operation on a goal whose steps were never fetched.
    #[error("steps for goal {0} are not loaded")]
    StepsNotLoaded(Uuid),

    #[error("unexpected data from backend: {0}")]
    Decode(String),
}

impl From<GatewayError> for GoalError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Unauthenticated | GatewayError::Auth(_) => GoalError::Unauthenticated,
            GatewayError::NotFound(what) => GoalError::NotFound(what),
            GatewayError::ValidationRejected(msg) => GoalError::ValidationRejected(msg),
            GatewayError::Transport(msg) => GoalError::TransportFailure(msg),
            GatewayError::Decode(msg) => GoalError::Decode(msg),
        }
    }
}

impl From<SuggestionError> for GoalError {
    fn from(e: SuggestionError) -> Self {
        match e {
            SuggestionError::Unavailable => GoalError::SuggestionUnavailable,
            SuggestionError::Failed(msg) => GoalError::SuggestionFailed(msg),
        }
    }
}

impl From<serde_json::Error> for GoalError {
    fn from(e: serde_json::Error) -> Self {
        GoalError::Decode(e.to_string())
    }
}

/// Failures of a notification sink. Logged, never surfaced to the user.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: String,
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
