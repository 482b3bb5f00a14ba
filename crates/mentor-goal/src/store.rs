// store.rs — GoalStore: cached goals and steps, reconciled with the backend.
//
// Every operation is write-through: local state changes only after the
// backend confirms. Each operation clears `error` when it starts, holds
// `loading` while in flight, and on failure both records the error in state
// and returns it. Operations are not serialized against each other; when two
// updates race, whichever completes last wins locally.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use mentor_gateway::{DataGateway, SuggestionGateway};
use mentor_session::SessionStore;
use mentor_state::{StateCell, Subscription};
use uuid::Uuid;

use crate::error::GoalError;
use crate::events::{EventDispatcher, GoalEvent};
use crate::model::{Goal, GoalDraft, GoalPatch, GoalStep, StepDraft, StepPatch};
use crate::service::GoalService;

/// Snapshot of the goal store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalState {
    /// Newest first by `created_at`.
    pub goals: Vec<Goal>,

    /// Cached steps per goal, oldest first. A goal is absent until its
    /// steps are fetched.
    pub steps: HashMap<Uuid, Vec<GoalStep>>,

    /// True while any operation is in flight.
    pub loading: bool,

    /// The failure of the most recent operation, if it failed.
    pub error: Option<GoalError>,

    in_flight: usize,
}

impl GoalState {
    pub fn goal(&self, goal_id: Uuid) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id == goal_id)
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}

fn sort_newest_first(goals: &mut [Goal]) {
    goals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Cloneable handle to the goal state and its operations.
#[derive(Clone)]
pub struct GoalStore {
    cell: StateCell<GoalState>,
    service: GoalService,
    suggestions: Arc<dyn SuggestionGateway>,
    events: Option<Arc<EventDispatcher>>,
}

impl GoalStore {
    pub fn new(
        gateway: Arc<dyn DataGateway>,
        session: SessionStore,
        suggestions: Arc<dyn SuggestionGateway>,
    ) -> Self {
        Self {
            cell: StateCell::default(),
            service: GoalService::new(gateway, session),
            suggestions,
            events: None,
        }
    }

    /// Report confirmed changes to `dispatcher`.
    pub fn with_events(mut self, dispatcher: EventDispatcher) -> Self {
        self.events = Some(Arc::new(dispatcher));
        self
    }

    pub fn snapshot(&self) -> GoalState {
        self.cell.snapshot()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&GoalState) + Send + Sync + 'static,
    {
        self.cell.subscribe(listener)
    }

    pub fn goals(&self) -> Vec<Goal> {
        self.cell.read(|state| state.goals.clone())
    }

    pub fn steps(&self, goal_id: Uuid) -> Option<Vec<GoalStep>> {
        self.cell.read(|state| state.steps.get(&goal_id).cloned())
    }

    pub fn error(&self) -> Option<GoalError> {
        self.cell.read(|state| state.error.clone())
    }

    /// Forget every cached goal and step, e.g. after sign-out.
    pub fn clear(&self) {
        self.cell.update(|state| {
            state.goals.clear();
            state.steps.clear();
            state.error = None;
        });
    }

    /// Run one operation with loading and error bookkeeping around it.
    async fn perform<T, F>(&self, op: &'static str, work: F) -> Result<T, GoalError>
    where
        F: Future<Output = Result<T, GoalError>>,
    {
        self.cell.update(|state| {
            state.in_flight += 1;
            state.loading = true;
            state.error = None;
        });

        let result = work.await;

        self.cell.update(|state| {
            state.in_flight = state.in_flight.saturating_sub(1);
            state.loading = state.in_flight > 0;
            if let Err(e) = &result {
                state.error = Some(e.clone());
            }
        });
        if let Err(e) = &result {
            tracing::warn!(op, error = %e, "goal operation failed");
        }
        result
    }

    fn emit(&self, event: GoalEvent) {
        if let Some(dispatcher) = &self.events {
            dispatcher.dispatch(&event);
        }
    }

    /// Length of the cached step list, or `StepsNotLoaded`.
    fn cached_step_count(&self, goal_id: Uuid) -> Result<usize, GoalError> {
        self.cell
            .read(|state| state.steps.get(&goal_id).map(Vec::len))
            .ok_or_else(|| {
                tracing::error!(%goal_id, "steps for goal are not loaded");
                GoalError::StepsNotLoaded(goal_id)
            })
    }

    /// Load the signed-in user's goals, replacing the cache.
    ///
    /// On failure the previous goals stay in place.
    pub async fn fetch_goals(&self) -> Result<Vec<Goal>, GoalError> {
        self.perform("fetch_goals", async move {
            let user_id = self.service.current_user_id()?;
            let goals = self.service.list_goals(user_id).await?;
            self.cell.update(|state| state.goals = goals.clone());
            tracing::debug!(count = goals.len(), "goals fetched");
            Ok(goals)
        })
        .await
    }

    /// Load one goal and merge it into the cache, keeping newest-first order.
    pub async fn fetch_goal_by_id(&self, goal_id: Uuid) -> Result<Goal, GoalError> {
        self.perform("fetch_goal_by_id", async move {
            let goal = self.service.get_goal(goal_id).await?;
            self.cell.update(|state| {
                state.goals.retain(|g| g.id != goal_id);
                state.goals.push(goal.clone());
                sort_newest_first(&mut state.goals);
            });
            Ok(goal)
        })
        .await
    }

    pub async fn add_goal(&self, draft: GoalDraft) -> Result<Goal, GoalError> {
        self.perform("add_goal", async move {
            let title = draft.title.trim();
            if title.is_empty() {
                return Err(GoalError::ValidationRejected(
                    "goal title must not be empty".to_string(),
                ));
            }
            let draft = GoalDraft {
                title: title.to_string(),
                ..draft
            };
            let user_id = self.service.current_user_id()?;
            let goal = self.service.create_goal(user_id, &draft).await?;
            self.cell.update(|state| {
                state.goals.retain(|g| g.id != goal.id);
                state.goals.insert(0, goal.clone());
            });
            tracing::info!(goal_id = %goal.id, "goal created");
            self.emit(GoalEvent::goal_created(goal.id, &goal.title));
            Ok(goal)
        })
        .await
    }

    /// Apply a partial update and replace the cached goal in place.
    pub async fn update_goal(&self, goal_id: Uuid, patch: GoalPatch) -> Result<Goal, GoalError> {
        self.perform("update_goal", async move {
            let patch = patch.normalize(Utc::now())?;
            let goal = self.service.update_goal(goal_id, &patch).await?;
            self.cell.update(|state| {
                if let Some(slot) = state.goals.iter_mut().find(|g| g.id == goal_id) {
                    *slot = goal.clone();
                }
            });

            let event = match patch.is_completed {
                Some(completed) => GoalEvent::GoalCompletionChanged {
                    goal_id,
                    completed,
                    timestamp: Utc::now(),
                },
                None => GoalEvent::GoalUpdated {
                    goal_id,
                    fields: changed_fields(&patch),
                    timestamp: Utc::now(),
                },
            };
            self.emit(event);
            Ok(goal)
        })
        .await
    }

    /// Delete remotely, then drop the goal and its cached steps.
    ///
    /// A goal the backend no longer has is still dropped locally, and the
    /// `NotFound` is reported.
    pub async fn delete_goal(&self, goal_id: Uuid) -> Result<(), GoalError> {
        self.perform("delete_goal", async move {
            let result = self.service.delete_goal(goal_id).await;
            if matches!(result, Ok(()) | Err(GoalError::NotFound(_))) {
                self.cell.update(|state| {
                    state.goals.retain(|g| g.id != goal_id);
                    state.steps.remove(&goal_id);
                });
            }
            result?;
            tracing::info!(%goal_id, "goal deleted");
            self.emit(GoalEvent::GoalDeleted {
                goal_id,
                timestamp: Utc::now(),
            });
            Ok(())
        })
        .await
    }

    /// Mark a goal complete (stamping `completed_at`) or reopen it.
    pub async fn toggle_complete(&self, goal_id: Uuid, completed: bool) -> Result<Goal, GoalError> {
        self.update_goal(goal_id, GoalPatch::completion(completed, Utc::now()))
            .await
    }

    /// Load a goal's steps, replacing its cached list.
    pub async fn fetch_steps(&self, goal_id: Uuid) -> Result<Vec<GoalStep>, GoalError> {
        self.perform("fetch_steps", async move {
            let steps = self.service.list_steps(goal_id).await?;
            self.cell.update(|state| {
                state.steps.insert(goal_id, steps.clone());
            });
            Ok(steps)
        })
        .await
    }

    /// Ask for suggested steps and append them to the goal's cached list.
    ///
    /// All suggestions are inserted in one call. Blank suggestions are
    /// dropped; when nothing is left no insert is made.
    pub async fn generate_and_add_steps(&self, goal: &Goal) -> Result<Vec<GoalStep>, GoalError> {
        self.perform("generate_and_add_steps", async move {
            let user_id = self.service.current_user_id()?;
            let suggestions = self
                .suggestions
                .suggest_steps(&goal.title, goal.description.as_deref())
                .await?;

            let start = self
                .cell
                .read(|state| state.steps.get(&goal.id).map_or(0, Vec::len));
            let drafts: Vec<StepDraft> = suggestions
                .into_iter()
                .map(|s| s.title.trim().to_string())
                .filter(|title| !title.is_empty())
                .enumerate()
                .map(|(i, title)| StepDraft::new(title).at((start + i + 1) as i32))
                .collect();
            if drafts.is_empty() {
                tracing::info!(goal_id = %goal.id, "no usable step suggestions");
                return Ok(Vec::new());
            }

            let created = self.service.create_steps(user_id, goal.id, &drafts).await?;
            self.cell.update(|state| {
                state
                    .steps
                    .entry(goal.id)
                    .or_default()
                    .extend(created.iter().cloned());
            });
            tracing::info!(goal_id = %goal.id, count = created.len(), "generated steps added");
            self.emit(GoalEvent::StepsGenerated {
                goal_id: goal.id,
                count: created.len(),
                timestamp: Utc::now(),
            });
            Ok(created)
        })
        .await
    }

    pub async fn add_step(&self, goal_id: Uuid, title: &str) -> Result<GoalStep, GoalError> {
        self.perform("add_step", async move {
            let title = title.trim();
            if title.is_empty() {
                return Err(GoalError::ValidationRejected(
                    "step title must not be empty".to_string(),
                ));
            }
            let count = self.cached_step_count(goal_id)?;
            let user_id = self.service.current_user_id()?;
            let draft = StepDraft::new(title).at((count + 1) as i32);

            let step = self
                .service
                .create_steps(user_id, goal_id, &[draft])
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| GoalError::Decode("insert returned no rows".to_string()))?;
            self.cell.update(|state| {
                if let Some(steps) = state.steps.get_mut(&goal_id) {
                    steps.push(step.clone());
                }
            });
            self.emit(GoalEvent::StepAdded {
                goal_id,
                step_id: step.id,
                title: step.title.clone(),
                timestamp: Utc::now(),
            });
            Ok(step)
        })
        .await
    }

    pub async fn update_step(
        &self,
        goal_id: Uuid,
        step_id: Uuid,
        patch: StepPatch,
    ) -> Result<GoalStep, GoalError> {
        self.perform("update_step", async move {
            patch.validate()?;
            self.cached_step_count(goal_id)?;
            let step = self.service.update_step(goal_id, step_id, &patch).await?;
            self.cell.update(|state| {
                if let Some(slot) = state
                    .steps
                    .get_mut(&goal_id)
                    .and_then(|steps| steps.iter_mut().find(|s| s.id == step_id))
                {
                    *slot = step.clone();
                }
            });
            Ok(step)
        })
        .await
    }

    /// Same `NotFound` policy as [`GoalStore::delete_goal`].
    pub async fn delete_step(&self, goal_id: Uuid, step_id: Uuid) -> Result<(), GoalError> {
        self.perform("delete_step", async move {
            self.cached_step_count(goal_id)?;
            let result = self.service.delete_step(goal_id, step_id).await;
            if matches!(result, Ok(()) | Err(GoalError::NotFound(_))) {
                self.cell.update(|state| {
                    if let Some(steps) = state.steps.get_mut(&goal_id) {
                        steps.retain(|s| s.id != step_id);
                    }
                });
            }
            result?;
            self.emit(GoalEvent::StepDeleted {
                goal_id,
                step_id,
                timestamp: Utc::now(),
            });
            Ok(())
        })
        .await
    }
}

/// Column names a patch touches.
fn changed_fields(patch: &GoalPatch) -> Vec<String> {
    match serde_json::to_value(patch) {
        Ok(serde_json::Value::Object(fields)) => fields.keys().cloned().collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentor_gateway::{
        tables, GatewayError, MemoryGateway, Query, StaticSuggestions,
    };
    use std::sync::Mutex;

    struct Fixture {
        memory: Arc<MemoryGateway>,
        session: SessionStore,
        suggestions: Arc<StaticSuggestions>,
        store: GoalStore,
        user_id: Uuid,
    }

    fn fixture_with(suggestions: StaticSuggestions) -> Fixture {
        let user_id = Uuid::new_v4();
        let signed_in = MemoryGateway::session_for(user_id);
        let memory = Arc::new(MemoryGateway::new().with_session(signed_in.clone()));
        let session = SessionStore::new();
        session.set_session(Some(signed_in));
        let suggestions = Arc::new(suggestions);
        let store = GoalStore::new(memory.clone(), session.clone(), suggestions.clone());
        Fixture {
            memory,
            session,
            suggestions,
            store,
            user_id,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(StaticSuggestions::titles(["Buy shoes", "Run 1k"]))
    }

    #[tokio::test]
    async fn added_goal_survives_refetch_without_duplicates() {
        let f = fixture();
        let goal = f.store.add_goal(GoalDraft::new("  Learn Rust ")).await.unwrap();
        assert_eq!(goal.title, "Learn Rust");
        assert_eq!(goal.user_id, f.user_id);

        let goals = f.store.fetch_goals().await.unwrap();
        assert!(goals.iter().any(|g| g.id == goal.id && g.title == "Learn Rust"));

        let state = f.store.snapshot();
        let mut ids: Vec<Uuid> = state.goals.iter().map(|g| g.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), state.goals.len());
    }

    #[tokio::test]
    async fn add_goal_prepends() {
        let f = fixture();
        f.store.add_goal(GoalDraft::new("First")).await.unwrap();
        let second = f.store.add_goal(GoalDraft::new("Second")).await.unwrap();
        assert_eq!(f.store.goals()[0].id, second.id);
    }

    #[tokio::test]
    async fn add_goal_without_session_records_error() {
        let memory: Arc<dyn DataGateway> = Arc::new(MemoryGateway::new());
        let store = GoalStore::new(
            memory,
            SessionStore::new(),
            Arc::new(StaticSuggestions::new(Vec::new())),
        );

        let err = store.add_goal(GoalDraft::new("Learn Rust")).await.unwrap_err();
        assert_eq!(err, GoalError::Unauthenticated);

        let state = store.snapshot();
        assert_eq!(state.error_message().as_deref(), Some("User is not authenticated"));
        assert!(state.goals.is_empty());
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn blank_goal_title_never_reaches_backend() {
        let f = fixture();
        let err = f.store.add_goal(GoalDraft::new("   ")).await.unwrap_err();
        assert!(matches!(err, GoalError::ValidationRejected(_)));
        assert_eq!(f.memory.table_calls(), 0);
    }

    #[tokio::test]
    async fn toggle_complete_keeps_timestamp_in_step_with_flag() {
        let f = fixture();
        let goal = f.store.add_goal(GoalDraft::new("Ship it")).await.unwrap();

        let done = f.store.toggle_complete(goal.id, true).await.unwrap();
        assert!(done.is_completed);
        assert!(done.completed_at.is_some());
        assert_eq!(f.store.goals()[0], done);

        let reopened = f.store.toggle_complete(goal.id, false).await.unwrap();
        assert!(!reopened.is_completed);
        assert!(reopened.completed_at.is_none());
    }

    #[tokio::test]
    async fn update_goal_replaces_in_place() {
        let f = fixture();
        let older = f.store.add_goal(GoalDraft::new("Older")).await.unwrap();
        f.store.add_goal(GoalDraft::new("Newer")).await.unwrap();

        let patch = GoalPatch {
            title: Some("Older, renamed".to_string()),
            ..GoalPatch::default()
        };
        f.store.update_goal(older.id, patch).await.unwrap();

        let goals = f.store.goals();
        assert_eq!(goals[1].id, older.id);
        assert_eq!(goals[1].title, "Older, renamed");
    }

    #[tokio::test]
    async fn update_missing_goal_is_not_found() {
        let f = fixture();
        let err = f
            .store
            .toggle_complete(Uuid::new_v4(), true)
            .await
            .unwrap_err();
        assert!(matches!(err, GoalError::NotFound(_)));
        assert_eq!(f.store.error(), Some(err));
    }

    #[tokio::test]
    async fn delete_twice_is_safe() {
        let f = fixture();
        let goal = f.store.add_goal(GoalDraft::new("Temporary")).await.unwrap();
        f.store.fetch_steps(goal.id).await.unwrap();

        f.store.delete_goal(goal.id).await.unwrap();
        let second = f.store.delete_goal(goal.id).await;
        assert!(matches!(second, Err(GoalError::NotFound(_))));

        let state = f.store.snapshot();
        assert!(state.goal(goal.id).is_none());
        assert!(!state.steps.contains_key(&goal.id));
    }

    #[tokio::test]
    async fn remote_not_found_still_drops_cached_goal() {
        let f = fixture();
        let goal = f.store.add_goal(GoalDraft::new("Gone elsewhere")).await.unwrap();
        f.memory
            .remove_rows(tables::GOALS, &Query::new().eq("id", goal.id));

        let result = f.store.delete_goal(goal.id).await;
        assert!(matches!(result, Err(GoalError::NotFound(_))));
        assert!(f.store.goals().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_keeps_stale_goals() {
        let f = fixture();
        f.store.add_goal(GoalDraft::new("Cached")).await.unwrap();

        f.memory
            .fail_next(GatewayError::Transport("connection reset".to_string()));
        let err = f.store.fetch_goals().await.unwrap_err();

        assert!(matches!(err, GoalError::TransportFailure(_)));
        let state = f.store.snapshot();
        assert_eq!(state.goals.len(), 1);
        assert!(!state.loading);
        assert!(state.error.is_some());
    }

    #[tokio::test]
    async fn next_operation_clears_previous_error() {
        let f = fixture();
        f.memory
            .fail_next(GatewayError::Transport("offline".to_string()));
        assert!(f.store.fetch_goals().await.is_err());

        f.store.fetch_goals().await.unwrap();
        assert!(f.store.error().is_none());
    }

    #[tokio::test]
    async fn fetch_goal_by_id_upserts_and_keeps_order() {
        let f = fixture();
        let older = f.store.add_goal(GoalDraft::new("Older")).await.unwrap();
        let newer = f.store.add_goal(GoalDraft::new("Newer")).await.unwrap();

        let refreshed = f.store.fetch_goal_by_id(older.id).await.unwrap();
        assert_eq!(refreshed, older);

        let ids: Vec<Uuid> = f.store.goals().iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[tokio::test]
    async fn fetch_steps_replaces_cache() {
        let f = fixture();
        let goal = f.store.add_goal(GoalDraft::new("Garden")).await.unwrap();
        f.store.fetch_steps(goal.id).await.unwrap();
        f.store.add_step(goal.id, "Dig").await.unwrap();
        f.store.add_step(goal.id, "Plant").await.unwrap();

        f.memory.remove_rows(
            tables::GOAL_STEPS,
            &Query::new().eq("goal_id", goal.id).eq("title", "Dig"),
        );
        let second = f.store.fetch_steps(goal.id).await.unwrap();

        assert_eq!(f.store.steps(goal.id), Some(second.clone()));
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].title, "Plant");
    }

    #[tokio::test]
    async fn generated_steps_are_appended_in_one_batch() {
        let f = fixture();
        let goal = f.store.add_goal(GoalDraft::new("Run 5k")).await.unwrap();
        f.store.fetch_steps(goal.id).await.unwrap();
        let existing = f.store.add_step(goal.id, "Plan route").await.unwrap();
        let calls_before = f.memory.table_calls();

        let created = f.store.generate_and_add_steps(&goal).await.unwrap();

        assert_eq!(created.len(), 2);
        assert_eq!(f.memory.table_calls(), calls_before + 1);
        let steps = f.store.steps(goal.id).unwrap();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0], existing);
        assert_eq!(steps[1].title, "Buy shoes");
        assert_eq!(steps[1].step_order, Some(2));
        assert_eq!(steps[2].step_order, Some(3));
    }

    #[tokio::test]
    async fn suggestion_failures_stay_distinct() {
        let unavailable = fixture_with(StaticSuggestions::unavailable());
        let goal = unavailable.store.add_goal(GoalDraft::new("A")).await.unwrap();
        let err = unavailable.store.generate_and_add_steps(&goal).await.unwrap_err();
        assert_eq!(err, GoalError::SuggestionUnavailable);

        let failing = fixture_with(StaticSuggestions::failing("quota exceeded"));
        let goal = failing.store.add_goal(GoalDraft::new("B")).await.unwrap();
        let err = failing.store.generate_and_add_steps(&goal).await.unwrap_err();
        assert_eq!(err, GoalError::SuggestionFailed("quota exceeded".to_string()));
        assert!(failing.store.steps(goal.id).is_none());
    }

    #[tokio::test]
    async fn blank_suggestions_produce_no_insert() {
        let f = fixture_with(StaticSuggestions::titles(["  ", ""]));
        let goal = f.store.add_goal(GoalDraft::new("Vague")).await.unwrap();
        let calls_before = f.memory.table_calls();

        let created = f.store.generate_and_add_steps(&goal).await.unwrap();
        assert!(created.is_empty());
        assert_eq!(f.memory.table_calls(), calls_before);
        assert_eq!(f.suggestions.calls(), 1);
    }

    #[tokio::test]
    async fn blank_step_title_makes_no_remote_call() {
        let f = fixture();
        let goal = f.store.add_goal(GoalDraft::new("Write")).await.unwrap();
        f.store.fetch_steps(goal.id).await.unwrap();
        let calls_before = f.memory.table_calls();

        let err = f.store.add_step(goal.id, " \t").await.unwrap_err();
        assert!(matches!(err, GoalError::ValidationRejected(_)));
        assert_eq!(f.memory.table_calls(), calls_before);
        assert_eq!(f.store.steps(goal.id), Some(Vec::new()));
    }

    #[tokio::test]
    async fn step_ops_on_unloaded_goal_fail_without_remote_call() {
        let f = fixture();
        let goal = f.store.add_goal(GoalDraft::new("Unloaded")).await.unwrap();
        let calls_before = f.memory.table_calls();

        let err = f.store.add_step(goal.id, "Step").await.unwrap_err();
        assert_eq!(err, GoalError::StepsNotLoaded(goal.id));
        let err = f
            .store
            .update_step(goal.id, Uuid::new_v4(), StepPatch::completed(true))
            .await
            .unwrap_err();
        assert_eq!(err, GoalError::StepsNotLoaded(goal.id));
        let err = f.store.delete_step(goal.id, Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err, GoalError::StepsNotLoaded(goal.id));

        assert_eq!(f.memory.table_calls(), calls_before);
    }

    #[tokio::test]
    async fn step_update_and_delete_reconcile_only_that_goal() {
        let f = fixture();
        let a = f.store.add_goal(GoalDraft::new("A")).await.unwrap();
        let b = f.store.add_goal(GoalDraft::new("B")).await.unwrap();
        f.store.fetch_steps(a.id).await.unwrap();
        f.store.fetch_steps(b.id).await.unwrap();
        let a1 = f.store.add_step(a.id, "a1").await.unwrap();
        let b1 = f.store.add_step(b.id, "b1").await.unwrap();

        let updated = f
            .store
            .update_step(a.id, a1.id, StepPatch::completed(true))
            .await
            .unwrap();
        assert!(updated.is_completed);
        assert_eq!(f.store.steps(a.id), Some(vec![updated]));

        f.store.delete_step(a.id, a1.id).await.unwrap();
        assert_eq!(f.store.steps(a.id), Some(Vec::new()));
        assert_eq!(f.store.steps(b.id), Some(vec![b1]));
    }

    #[tokio::test]
    async fn signed_out_session_store_blocks_goal_writes() {
        let f = fixture();
        f.session.set_session(None);

        let err = f.store.add_goal(GoalDraft::new("Orphan")).await.unwrap_err();
        assert_eq!(err, GoalError::Unauthenticated);
        assert_eq!(f.memory.table_calls(), 0);
    }

    #[tokio::test]
    async fn clear_forgets_goals_steps_and_error() {
        let f = fixture();
        let goal = f.store.add_goal(GoalDraft::new("Mine")).await.unwrap();
        f.store.fetch_steps(goal.id).await.unwrap();
        f.memory
            .fail_next(GatewayError::Transport("offline".to_string()));
        assert!(f.store.fetch_goals().await.is_err());

        f.store.clear();
        let state = f.store.snapshot();
        assert!(state.goals.is_empty());
        assert!(state.steps.is_empty());
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn loading_is_set_during_operation_and_cleared_after() {
        let f = fixture();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = f.store.subscribe(move |state| sink.lock().unwrap().push(state.loading));

        f.store.fetch_goals().await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.first(), Some(&true));
        assert_eq!(seen.last(), Some(&false));
    }
}
