// auth.rs — Session, user identity, and auth events issued by the data gateway.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity claims carried by a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// An authenticated session: bearer token plus identity claims.
///
/// Deserializes directly from the auth endpoint's token response; unknown
/// fields (`token_type`, `expires_in`, user metadata) are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Expiry as a unix timestamp in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,

    pub user: User,
}

impl Session {
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }

    /// Whether the access token has expired as of `now` (unix seconds).
    /// A session without an expiry never expires.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// Email + password credentials for sign-up and sign-in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Auth state changes pushed by the data gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// The session known at startup (possibly none).
    InitialSession(Option<Session>),
    SignedIn(Session),
    SignedOut,
    TokenRefreshed(Session),
    UserUpdated(Session),
}

impl AuthEvent {
    /// The session carried by the event, if any.
    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthEvent::InitialSession(session) => session.as_ref(),
            AuthEvent::SignedIn(session)
            | AuthEvent::TokenRefreshed(session)
            | AuthEvent::UserUpdated(session) => Some(session),
            AuthEvent::SignedOut => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AuthEvent::InitialSession(_) => "initial_session",
            AuthEvent::SignedIn(_) => "signed_in",
            AuthEvent::SignedOut => "signed_out",
            AuthEvent::TokenRefreshed(_) => "token_refreshed",
            AuthEvent::UserUpdated(_) => "user_updated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_parses_token_response() {
        let body = serde_json::json!({
            "access_token": "jwt-token",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 1700000000,
            "refresh_token": "refresh",
            "user": {
                "id": "2b7c2d0e-5a55-4d7e-9d8e-0a8c2f0f4f11",
                "aud": "authenticated",
                "email": "ada@example.com"
            }
        });
        let session: Session = serde_json::from_value(body).unwrap();
        assert_eq!(session.access_token, "jwt-token");
        assert_eq!(session.refresh_token.as_deref(), Some("refresh"));
        assert_eq!(session.user.email.as_deref(), Some("ada@example.com"));
    }

    #[test]
    fn expiry_is_inclusive() {
        let session = Session {
            access_token: "t".to_string(),
            refresh_token: None,
            expires_at: Some(100),
            user: User {
                id: Uuid::new_v4(),
                email: None,
            },
        };
        assert!(!session.is_expired_at(99));
        assert!(session.is_expired_at(100));
    }

    #[test]
    fn signed_out_carries_no_session() {
        assert!(AuthEvent::SignedOut.session().is_none());
        assert_eq!(AuthEvent::SignedOut.name(), "signed_out");
    }
}
