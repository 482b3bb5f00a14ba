// rest.rs — RestGateway: Supabase-compatible REST adapter.
//
// Three surfaces under one base URL:
//   /auth/v1     — sign-up, password sign-in, refresh, logout
//   /rest/v1     — PostgREST table access (filters as query parameters)
//   /storage/v1  — object upload and public object URLs
//
// Every request carries the anonymous key as `apikey`. The bearer token is
// the session's access token when signed in, the anonymous key otherwise,
// so row-level security sees the right identity.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::broadcast;

use crate::auth::{AuthEvent, Credentials, Session};
use crate::config::GatewayConfig;
use crate::data::DataGateway;
use crate::error::{GatewayError, Result};
use crate::query::Query;

const AUTH_EVENT_CAPACITY: usize = 16;

/// HTTP adapter for the backend's auth, table, and storage APIs.
pub struct RestGateway {
    config: GatewayConfig,
    http: reqwest::Client,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
}

impl RestGateway {
    /// Create a gateway with no session.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        if !config.url.starts_with("http://") && !config.url.starts_with("https://") {
            return Err(GatewayError::ValidationRejected(format!(
                "backend URL must be http(s): {}",
                config.url
            )));
        }
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Ok(Self {
            config,
            http: reqwest::Client::new(),
            session: RwLock::new(None),
            events,
        })
    }

    /// Resume a previously persisted session.
    pub fn with_session(self, session: Session) -> Self {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
        self
    }

    fn current_session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace_session(&self, session: Option<Session>, event: AuthEvent) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session;
        tracing::debug!(event = event.name(), "auth state changed");
        // No receivers is fine: nobody is listening yet.
        let _ = self.events.send(event);
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url(), path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        let token = self
            .current_session()
            .map(|s| s.access_token)
            .unwrap_or_else(|| self.config.anon_key.clone());
        builder
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token)
    }

    async fn send_rows(&self, resource: &str, request: RequestBuilder) -> Result<Vec<Value>> {
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(table_error(response, resource).await);
        }
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(into_rows(serde_json::from_str(&text)?))
    }

    async fn send_auth(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(auth_error(response).await);
        }
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn table(&self, table: &str) -> String {
        self.endpoint(&format!("rest/v1/{}", table))
    }
}

#[async_trait]
impl DataGateway for RestGateway {
    async fn session(&self) -> Option<Session> {
        self.current_session()
    }

    fn subscribe_auth_events(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<Option<Session>> {
        let request = self
            .http
            .post(self.endpoint("auth/v1/signup"))
            .header("apikey", &self.config.anon_key)
            .json(credentials);
        let body = self.send_auth(request).await?;

        // With email confirmation enabled the response is the bare user.
        if body.get("access_token").is_none() {
            tracing::info!(email = %credentials.email, "sign-up pending email confirmation");
            return Ok(None);
        }
        let session: Session = serde_json::from_value(body)?;
        self.replace_session(Some(session.clone()), AuthEvent::SignedIn(session.clone()));
        Ok(Some(session))
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session> {
        let request = self
            .http
            .post(self.endpoint("auth/v1/token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.config.anon_key)
            .json(credentials);
        let session: Session = serde_json::from_value(self.send_auth(request).await?)?;
        self.replace_session(Some(session.clone()), AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        if self.current_session().is_some() {
            let request = self.authorized(self.http.post(self.endpoint("auth/v1/logout")));
            if let Err(e) = self.send_auth(request).await {
                // The local session is dropped regardless; the token expires on its own.
                tracing::warn!(error = %e, "remote sign-out failed");
            }
        }
        self.replace_session(None, AuthEvent::SignedOut);
        Ok(())
    }

    async fn refresh_session(&self) -> Result<Session> {
        let refresh_token = self
            .current_session()
            .and_then(|s| s.refresh_token)
            .ok_or(GatewayError::Unauthenticated)?;
        let request = self
            .http
            .post(self.endpoint("auth/v1/token"))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.config.anon_key)
            .json(&json!({ "refresh_token": refresh_token }));
        let session: Session = serde_json::from_value(self.send_auth(request).await?)?;
        self.replace_session(
            Some(session.clone()),
            AuthEvent::TokenRefreshed(session.clone()),
        );
        Ok(session)
    }

    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>> {
        tracing::debug!(table, ?query, "select");
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(query.to_params());
        let request = self.authorized(self.http.get(self.table(table)).query(&params));
        self.send_rows(table, request).await
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>> {
        tracing::debug!(table, count = rows.len(), "insert");
        let request = self.authorized(
            self.http
                .post(self.table(table))
                .header("Prefer", "return=representation")
                .json(&rows),
        );
        self.send_rows(table, request).await
    }

    async fn upsert(&self, table: &str, row: Value) -> Result<Vec<Value>> {
        tracing::debug!(table, "upsert");
        let request = self.authorized(
            self.http
                .post(self.table(table))
                .header("Prefer", "resolution=merge-duplicates,return=representation")
                .json(&row),
        );
        self.send_rows(table, request).await
    }

    async fn update(&self, table: &str, query: &Query, patch: Value) -> Result<Vec<Value>> {
        tracing::debug!(table, ?query, "update");
        let request = self.authorized(
            self.http
                .patch(self.table(table))
                .query(&query.to_params())
                .header("Prefer", "return=representation")
                .json(&patch),
        );
        self.send_rows(table, request).await
    }

    async fn delete(&self, table: &str, query: &Query) -> Result<Vec<Value>> {
        tracing::debug!(table, ?query, "delete");
        let request = self.authorized(
            self.http
                .delete(self.table(table))
                .query(&query.to_params())
                .header("Prefer", "return=representation"),
        );
        self.send_rows(table, request).await
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        tracing::debug!(bucket, path, size = bytes.len(), "upload");
        let url = self.endpoint(&format!("storage/v1/object/{}/{}", bucket, path));
        let request = self.authorized(
            self.http
                .post(url)
                .header("Content-Type", content_type)
                .header("x-upsert", "false")
                .body(bytes),
        );
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(table_error(response, bucket).await);
        }
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.endpoint(&format!("storage/v1/object/public/{}/{}", bucket, path))
    }
}

/// Error payloads across the three APIs use different field names.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    error_description: Option<String>,
}

impl ErrorBody {
    fn parse(status: StatusCode, body: &str) -> (String, String) {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let code = parsed.code.map(value_text).unwrap_or_default();
        let message = parsed
            .message
            .or(parsed.error_description)
            .or(parsed.msg)
            .or(parsed.error.map(value_text))
            .unwrap_or_else(|| body.trim().to_string());
        let message = if message.is_empty() {
            status.to_string()
        } else {
            message
        };
        (code, message)
    }
}

fn value_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

async fn table_error(response: Response, resource: &str) -> GatewayError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    classify_table_error(status, &body, resource)
}

fn classify_table_error(status: StatusCode, body: &str, resource: &str) -> GatewayError {
    let (code, message) = ErrorBody::parse(status, body);
    tracing::debug!(%status, code = %code, message = %message, resource, "backend error");
    match (status.as_u16(), code.as_str()) {
        (_, "42501") | (401, _) | (403, _) => GatewayError::Unauthenticated,
        (_, "PGRST116") | (404, _) => GatewayError::NotFound(format!("{}: {}", resource, message)),
        (_, c) if c.starts_with("22") || c.starts_with("23") => {
            GatewayError::ValidationRejected(message)
        }
        (400 | 409 | 422, _) => GatewayError::ValidationRejected(message),
        _ => GatewayError::Transport(format!("{}: {}", status, message)),
    }
}

async fn auth_error(response: Response) -> GatewayError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let (_, message) = ErrorBody::parse(status, &body);
    if status.is_server_error() {
        GatewayError::Transport(format!("{}: {}", status, message))
    } else {
        GatewayError::Auth(message)
    }
}

fn into_rows(value: Value) -> Vec<Value> {
    match value {
        Value::Array(rows) => rows,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> RestGateway {
        RestGateway::new(GatewayConfig::new("https://abc.supabase.co/", "anon")).unwrap()
    }

    #[test]
    fn rejects_non_http_url() {
        let result = RestGateway::new(GatewayConfig::new("abc.supabase.co", "anon"));
        assert!(matches!(result, Err(GatewayError::ValidationRejected(_))));
    }

    #[test]
    fn public_url_points_at_public_bucket() {
        assert_eq!(
            gateway().public_url("avatars", "u1/a.png"),
            "https://abc.supabase.co/storage/v1/object/public/avatars/u1/a.png"
        );
    }

    #[test]
    fn row_level_security_violation_is_unauthenticated() {
        let body = r#"{"code":"42501","message":"new row violates row-level security policy"}"#;
        assert_eq!(
            classify_table_error(StatusCode::BAD_REQUEST, body, "goals"),
            GatewayError::Unauthenticated
        );
    }

    #[test]
    fn not_null_violation_is_validation() {
        let body = r#"{"code":"23502","message":"null value in column \"title\""}"#;
        assert!(matches!(
            classify_table_error(StatusCode::BAD_REQUEST, body, "goals"),
            GatewayError::ValidationRejected(m) if m.contains("title")
        ));
    }

    #[test]
    fn server_errors_are_transport_failures() {
        assert!(matches!(
            classify_table_error(StatusCode::BAD_GATEWAY, "", "goals"),
            GatewayError::Transport(_)
        ));
    }

    #[test]
    fn single_object_body_becomes_one_row() {
        assert_eq!(into_rows(serde_json::json!({"id": 1})).len(), 1);
        assert!(into_rows(Value::Null).is_empty());
    }

    #[tokio::test]
    async fn sign_out_without_session_broadcasts_signed_out() {
        let gateway = gateway();
        let mut events = gateway.subscribe_auth_events();
        gateway.sign_out().await.unwrap();
        assert_eq!(events.recv().await.unwrap(), AuthEvent::SignedOut);
        assert!(gateway.session().await.is_none());
    }
}
