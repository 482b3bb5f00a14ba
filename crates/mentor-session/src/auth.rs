// auth.rs — AuthService: account lifecycle on top of the data gateway.
//
// Each call writes the confirmed session into the store before returning, so
// the store is current as soon as the caller resumes. The gateway's auth event
// reaches the SessionListener afterwards and re-applies the same session,
// fetching the profile on sign-in.

use std::sync::Arc;

use mentor_gateway::{Credentials, DataGateway, Session};

use crate::error::SessionError;
use crate::profile::ProfileService;
use crate::store::SessionStore;

#[derive(Clone)]
pub struct AuthService {
    gateway: Arc<dyn DataGateway>,
    store: SessionStore,
    profiles: ProfileService,
}

impl AuthService {
    pub fn new(gateway: Arc<dyn DataGateway>, store: SessionStore, profiles: ProfileService) -> Self {
        Self {
            gateway,
            store,
            profiles,
        }
    }

    /// Register a new account. `None` means the backend is waiting for the
    /// user to confirm their email.
    pub async fn sign_up(&self, credentials: &Credentials) -> Result<Option<Session>, SessionError> {
        let session = self.gateway.sign_up(credentials).await?;
        tracing::info!(email = %credentials.email, signed_in = session.is_some(), "signed up");
        if session.is_some() {
            self.store.set_session(session.clone());
        }
        Ok(session)
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Session, SessionError> {
        let session = self.gateway.sign_in(credentials).await?;
        tracing::info!(user_id = %session.user.id, "signed in");
        self.store.set_session(Some(session.clone()));
        Ok(session)
    }

    pub async fn sign_out(&self) -> Result<(), SessionError> {
        self.gateway.sign_out().await?;
        tracing::info!("signed out");
        self.store.set_session(None);
        self.store.set_profile(None);
        Ok(())
    }

    /// Resolve the session known to the gateway at startup.
    ///
    /// Loads the profile when signed in and always clears `loading`, even
    /// if the profile fetch fails.
    pub async fn restore_session(&self) -> Option<Session> {
        let session = self.gateway.session().await;
        self.store.set_session(session.clone());
        if session.is_some() {
            if let Err(e) = self.profiles.fetch_profile().await {
                tracing::warn!(error = %e, "profile unavailable during session restore");
            }
        }
        self.store.set_loading(false);
        session
    }
}
