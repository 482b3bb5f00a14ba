// store.rs — SessionStore: the single source of truth for "who is signed in".
//
// Every mutation is a plain state replacement; subscribers are notified
// synchronously after each one. `loading` starts true and stays true until
// the initial session has been resolved.

use mentor_gateway::{Session, User};
use mentor_state::{StateCell, Subscription};
use uuid::Uuid;

use crate::profile::Profile;

/// Snapshot of the session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub session: Option<Session>,

    /// Derived from `session`; `None` whenever `session` is.
    pub user: Option<User>,

    pub profile: Option<Profile>,

    /// True until the initial session lookup completes. Protected screens
    /// must not render while set.
    pub loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            session: None,
            user: None,
            profile: None,
            loading: true,
        }
    }
}

impl SessionState {
    pub fn is_resolved(&self) -> bool {
        !self.loading
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    /// A loaded profile that has not finished onboarding.
    pub fn needs_onboarding(&self) -> bool {
        self.profile
            .as_ref()
            .is_some_and(|p| !p.has_completed_onboarding())
    }
}

/// Cloneable handle to the session state.
#[derive(Clone, Default)]
pub struct SessionStore {
    cell: StateCell<SessionState>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SessionState {
        self.cell.snapshot()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        self.cell.subscribe(listener)
    }

    /// Replace the session. Clearing it also clears the derived user.
    pub fn set_session(&self, session: Option<Session>) {
        self.cell.update(|state| {
            state.user = session.as_ref().map(|s| s.user.clone());
            state.session = session;
        });
    }

    pub fn set_profile(&self, profile: Option<Profile>) {
        self.cell.update(|state| state.profile = profile);
    }

    pub fn set_loading(&self, loading: bool) {
        self.cell.update(|state| state.loading = loading);
    }

    pub fn current_user_id(&self) -> Option<Uuid> {
        self.cell.read(|state| state.user.as_ref().map(|u| u.id))
    }

    pub fn profile(&self) -> Option<Profile> {
        self.cell.read(|state| state.profile.clone())
    }
}
