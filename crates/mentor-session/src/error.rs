// error.rs — Error types for auth, profile, and onboarding operations.

use mentor_gateway::GatewayError;
use thiserror::Error;

/// Errors from auth and profile operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The operation needs a signed-in user.
    #[error("No user logged in")]
    NotSignedIn,

    /// The backend call failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A profile row could not be decoded.
    #[error("unexpected profile data: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for SessionError {
    fn from(e: serde_json::Error) -> Self {
        SessionError::Decode(e.to_string())
    }
}

/// Onboarding failures. The Display text is what the user sees in the
/// blocking alert.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OnboardingError {
    #[error("Error updating profile: {0}")]
    ProfileDetails(#[source] SessionError),

    #[error("Error uploading avatar: {0}")]
    AvatarUpload(#[source] SessionError),

    #[error("There was an error completing your setup. Please try again.")]
    Finish(#[source] SessionError),

    #[error("setup can only be finished from the last step")]
    NotAtLastStep,
}
