// error.rs — Error types for the remote data gateway.

use thiserror::Error;

/// Errors returned by [`crate::DataGateway`] implementations.
///
/// Variants carry strings rather than source errors so the error can be
/// cloned into store state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// No session, or the session is not allowed to touch the row.
    #[error("not authenticated")]
    Unauthenticated,

    /// The addressed resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend rejected the payload (constraint, type, or FK failure).
    #[error("rejected by backend: {0}")]
    ValidationRejected(String),

    /// Network failure or backend unavailable.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The response body did not have the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Sign-in, sign-up, or sign-out was refused.
    #[error("auth error: {0}")]
    Auth(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            GatewayError::Decode(e.to_string())
        } else {
            GatewayError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        GatewayError::Decode(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
