// data.rs — The DataGateway trait: the backend surface the stores consume.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::auth::{AuthEvent, Credentials, Session};
use crate::error::Result;
use crate::query::Query;

/// Table names used by the application.
pub mod tables {
    pub const PROFILES: &str = "profiles";
    pub const GOALS: &str = "goals";
    pub const GOAL_STEPS: &str = "goal_steps";
}

/// Storage bucket holding profile pictures.
pub const AVATAR_BUCKET: &str = "avatars";

/// Backend-as-a-service surface: auth, table CRUD, and object storage.
///
/// Rows travel as JSON objects; typed services above this trait decode them.
/// Every write call returns the affected rows so callers can reconcile local
/// state from the backend's view of the record.
#[async_trait]
pub trait DataGateway: Send + Sync {
    /// The current session, if signed in.
    async fn session(&self) -> Option<Session>;

    /// Subscribe to auth state changes. Events published before the call are
    /// not replayed.
    fn subscribe_auth_events(&self) -> broadcast::Receiver<AuthEvent>;

    /// Register a new account. Returns a session when the backend signs the
    /// user in immediately, `None` when it waits for email confirmation.
    async fn sign_up(&self, credentials: &Credentials) -> Result<Option<Session>>;

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session>;

    async fn sign_out(&self) -> Result<()>;

    /// Exchange the refresh token for a new session.
    async fn refresh_session(&self) -> Result<Session>;

    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>>;

    /// Insert one or more rows in a single call.
    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>>;

    /// Insert, or merge into the row with the same primary key.
    async fn upsert(&self, table: &str, row: Value) -> Result<Vec<Value>>;

    async fn update(&self, table: &str, query: &Query, patch: Value) -> Result<Vec<Value>>;

    async fn delete(&self, table: &str, query: &Query) -> Result<Vec<Value>>;

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<()>;

    /// Durable public URL for an uploaded object.
    fn public_url(&self, bucket: &str, path: &str) -> String;
}
