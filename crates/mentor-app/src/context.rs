// context.rs — AppContext: builds the gateways and stores once and wires
// them together.
//
// Nothing here is a global: the context owns one data gateway, one
// suggestion gateway, and one of each store, and hands out clones of the
// store handles. `start` attaches the auth listener and resolves the
// initial session. Cached goals are dropped whenever the signed-in user goes
// away or changes.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use mentor_gateway::{
    DataGateway, GeminiGateway, MemoryGateway, RestGateway, Session, StaticSuggestions,
    SuggestionGateway,
};
use mentor_goal::{EventDispatcher, GoalStore, LogSink};
use mentor_session::{
    AuthService, OnboardingFlow, ProfileService, SessionListener, SessionStore,
};
use mentor_state::Subscription;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::AppError;

pub struct AppContext {
    gateway: Arc<dyn DataGateway>,
    session: SessionStore,
    profiles: ProfileService,
    auth: AuthService,
    goals: GoalStore,
    suggestions_enabled: bool,
    listener: Option<SessionListener>,
    _account_watch: Subscription,
}

/// Clear `goals` when the session store's user is signed out or replaced.
fn watch_account(session: &SessionStore, goals: GoalStore) -> Subscription {
    let last_user: Mutex<Option<Uuid>> = Mutex::new(session.current_user_id());
    session.subscribe(move |state| {
        let user_id = state.user.as_ref().map(|user| user.id);
        let previous = {
            let mut last = last_user.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *last, user_id)
        };
        if previous.is_some() && previous != user_id {
            tracing::debug!("signed-in user changed; clearing cached goals");
            goals.clear();
        }
    })
}

impl AppContext {
    /// Wire stores over the given gateways.
    pub fn new(
        gateway: Arc<dyn DataGateway>,
        suggestions: Arc<dyn SuggestionGateway>,
        activity_log: Option<&Path>,
    ) -> Self {
        let session = SessionStore::new();
        let profiles = ProfileService::new(Arc::clone(&gateway), session.clone());
        let auth = AuthService::new(Arc::clone(&gateway), session.clone(), profiles.clone());

        let mut goals = GoalStore::new(Arc::clone(&gateway), session.clone(), suggestions);
        if let Some(path) = activity_log {
            let mut dispatcher = EventDispatcher::new();
            dispatcher.add_sink(Box::new(LogSink::new(path)));
            goals = goals.with_events(dispatcher);
            tracing::debug!(path = %path.display(), "goal activity log enabled");
        }

        let account_watch = watch_account(&session, goals.clone());
        Self {
            gateway,
            session,
            profiles,
            auth,
            goals,
            suggestions_enabled: true,
            listener: None,
            _account_watch: account_watch,
        }
    }

    /// Connect to the configured backend, resuming `session` if given.
    pub fn from_config(config: &AppConfig, session: Option<Session>) -> Result<Self, AppError> {
        let mut rest = RestGateway::new(config.gateway_config()?)?;
        if let Some(session) = session {
            rest = rest.with_session(session);
        }
        let gemini = GeminiGateway::new(config.suggestion_config());
        let suggestions_enabled = gemini.is_available();
        if !suggestions_enabled {
            tracing::warn!("no Gemini API key configured; step suggestions are disabled");
        }

        let mut context = Self::new(
            Arc::new(rest),
            Arc::new(gemini),
            config.activity_log.as_deref(),
        );
        context.suggestions_enabled = suggestions_enabled;
        Ok(context)
    }

    /// Fully in-process context with no suggestion source.
    pub fn in_memory() -> Self {
        let mut context = Self::new(
            Arc::new(MemoryGateway::new()),
            Arc::new(StaticSuggestions::unavailable()),
            None,
        );
        context.suggestions_enabled = false;
        context
    }

    /// Attach the auth listener and resolve the initial session.
    ///
    /// Must run inside a tokio runtime. Calling it again re-resolves the
    /// session but keeps the existing listener.
    pub async fn start(&mut self) -> Option<Session> {
        if self.listener.is_none() {
            self.listener = Some(SessionListener::attach(
                &self.gateway,
                self.session.clone(),
                self.profiles.clone(),
            ));
        }
        self.auth.restore_session().await
    }

    pub fn is_started(&self) -> bool {
        self.listener.is_some()
    }

    pub fn gateway(&self) -> &Arc<dyn DataGateway> {
        &self.gateway
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn profiles(&self) -> &ProfileService {
        &self.profiles
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn goals(&self) -> &GoalStore {
        &self.goals
    }

    pub fn suggestions_enabled(&self) -> bool {
        self.suggestions_enabled
    }

    pub fn onboarding(&self) -> OnboardingFlow {
        OnboardingFlow::new(self.profiles.clone())
    }
}
