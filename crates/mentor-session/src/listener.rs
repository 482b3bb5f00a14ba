// listener.rs — SessionListener: applies gateway auth events to the store.
//
// Every event replaces the cached session. Sign-in also loads the profile,
// sign-out drops it, and `loading` is cleared once the event is applied.
// The receiver is taken in `attach`, so events published after it returns
// are never missed. Dropping the listener stops the task.

use std::sync::Arc;

use mentor_gateway::{AuthEvent, DataGateway};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::profile::ProfileService;
use crate::store::SessionStore;

pub struct SessionListener {
    handle: JoinHandle<()>,
}

impl SessionListener {
    /// Subscribe to `gateway`'s auth events and start applying them.
    ///
    /// Must be called from within a tokio runtime.
    pub fn attach(
        gateway: &Arc<dyn DataGateway>,
        store: SessionStore,
        profiles: ProfileService,
    ) -> Self {
        let mut events = gateway.subscribe_auth_events();
        let gateway = Arc::clone(gateway);

        let handle = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => apply(&event, &store, &profiles).await,
                    Err(RecvError::Lagged(skipped)) => {
                        // Missed events: resynchronize from the gateway's view.
                        tracing::warn!(skipped, "auth events lagged, resyncing session");
                        let session = gateway.session().await;
                        let event = match session {
                            Some(session) => AuthEvent::SignedIn(session),
                            None => AuthEvent::SignedOut,
                        };
                        apply(&event, &store, &profiles).await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            tracing::debug!("auth event stream closed");
        });

        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for SessionListener {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn apply(event: &AuthEvent, store: &SessionStore, profiles: &ProfileService) {
    tracing::debug!(event = event.name(), "auth state changed");
    store.set_session(event.session().cloned());

    match event {
        AuthEvent::SignedIn(_) => {
            // Already logged by the profile service.
            let _ = profiles.fetch_profile().await;
        }
        AuthEvent::SignedOut => store.set_profile(None),
        _ => {}
    }

    store.set_loading(false);
}
