// profile.rs — Profile record and the service that reads and writes it.
//
// A profile is keyed by the user id and created implicitly by the first
// upsert. The service always stamps `id` from the cached session and
// `updated_at` with the current time, then refreshes the cached copy in the
// session store from the backend.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mentor_gateway::{tables, DataGateway, Query, AVATAR_BUCKET};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SessionError;
use crate::store::SessionStore;

/// One user's public identity record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    /// Equals the owning user's id.
    pub id: Uuid,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub full_name: Option<String>,

    #[serde(default)]
    pub avatar_url: Option<String>,

    #[serde(default)]
    pub website: Option<String>,

    #[serde(default)]
    pub onboarding_complete: Option<bool>,
}

impl Profile {
    /// A profile with only its id set.
    pub fn empty(id: Uuid) -> Self {
        Self {
            id,
            updated_at: None,
            username: None,
            full_name: None,
            avatar_url: None,
            website: None,
            onboarding_complete: None,
        }
    }

    pub fn has_completed_onboarding(&self) -> bool {
        self.onboarding_complete.unwrap_or(false)
    }
}

/// Fields to change on the profile; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboarding_complete: Option<bool>,
}

impl ProfileUpdate {
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    pub fn website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    pub fn avatar_url(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }

    pub fn onboarding_complete(mut self, complete: bool) -> Self {
        self.onboarding_complete = Some(complete);
        self
    }
}

/// Reads and writes the signed-in user's profile.
#[derive(Clone)]
pub struct ProfileService {
    gateway: Arc<dyn DataGateway>,
    store: SessionStore,
}

impl ProfileService {
    pub fn new(gateway: Arc<dyn DataGateway>, store: SessionStore) -> Self {
        Self { gateway, store }
    }

    fn user_id(&self) -> Result<Uuid, SessionError> {
        self.store
            .current_user_id()
            .ok_or(SessionError::NotSignedIn)
    }

    /// Load the profile into the session store.
    ///
    /// A missing row is not an error: the cached profile is left as-is.
    pub async fn fetch_profile(&self) -> Result<Option<Profile>, SessionError> {
        let result = self.load_profile().await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "error fetching profile");
        }
        result
    }

    async fn load_profile(&self) -> Result<Option<Profile>, SessionError> {
        let user_id = self.user_id()?;
        let rows = self
            .gateway
            .select(tables::PROFILES, &Query::new().eq("id", user_id))
            .await?;
        let Some(row) = rows.into_iter().next() else {
            tracing::debug!(%user_id, "no profile row yet");
            return Ok(None);
        };
        let profile: Profile = serde_json::from_value(row)?;
        self.store.set_profile(Some(profile.clone()));
        Ok(Some(profile))
    }

    /// Upsert the profile, then refresh the cached copy.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<(), SessionError> {
        let user_id = self.user_id()?;
        let mut row = serde_json::to_value(&update)?;
        if let Some(fields) = row.as_object_mut() {
            fields.insert("id".to_string(), serde_json::to_value(user_id)?);
            fields.insert("updated_at".to_string(), serde_json::to_value(Utc::now())?);
        }
        self.gateway.upsert(tables::PROFILES, row).await?;
        tracing::info!(%user_id, "profile updated");

        self.fetch_profile().await?;
        Ok(())
    }

    /// Upload an avatar image and point the profile at its public URL.
    ///
    /// The object lands at `<user-id>/<random>.<ext>` so uploads never
    /// collide. Returns the public URL.
    pub async fn upload_avatar(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, SessionError> {
        let user_id = self.user_id()?;
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "bin".to_string());
        let path = format!("{}/{}.{}", user_id, Uuid::new_v4(), extension);

        self.gateway
            .upload(AVATAR_BUCKET, &path, bytes, content_type(&extension))
            .await?;
        let url = self.gateway.public_url(AVATAR_BUCKET, &path);
        tracing::info!(%user_id, path = %path, "avatar uploaded");

        self.update_profile(ProfileUpdate::default().avatar_url(url.clone()))
            .await?;
        Ok(url)
    }
}

fn content_type(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
