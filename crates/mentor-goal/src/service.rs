// service.rs — GoalService: typed goal and step calls over the data gateway.
//
// Builds rows and queries for the `goals` and `goal_steps` tables and decodes
// what comes back. Holds no state; the GoalStore decides what to cache. The
// signed-in user is read from the SessionStore, never from the gateway.

use std::sync::Arc;

use mentor_gateway::{tables, DataGateway, Direction, Query};
use mentor_session::SessionStore;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::GoalError;
use crate::model::{Goal, GoalDraft, GoalPatch, GoalStep, StepDraft, StepPatch};

#[derive(Clone)]
pub struct GoalService {
    gateway: Arc<dyn DataGateway>,
    session: SessionStore,
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, GoalError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(GoalError::from))
        .collect()
}

/// The single row a write by id affected, or `NotFound`.
fn single<T: DeserializeOwned>(rows: Vec<Value>, what: String) -> Result<T, GoalError> {
    match rows.into_iter().next() {
        Some(row) => Ok(serde_json::from_value(row)?),
        None => Err(GoalError::NotFound(what)),
    }
}

impl GoalService {
    pub fn new(gateway: Arc<dyn DataGateway>, session: SessionStore) -> Self {
        Self { gateway, session }
    }

    /// The signed-in user's id, per the session store.
    pub fn current_user_id(&self) -> Result<Uuid, GoalError> {
        self.session
            .current_user_id()
            .ok_or(GoalError::Unauthenticated)
    }

    /// Newest first.
    pub async fn list_goals(&self, user_id: Uuid) -> Result<Vec<Goal>, GoalError> {
        let query = Query::new()
            .eq("user_id", user_id)
            .order("created_at", Direction::Descending);
        tracing::debug!(%user_id, "selecting goals");
        decode_rows(self.gateway.select(tables::GOALS, &query).await?)
    }

    pub async fn get_goal(&self, goal_id: Uuid) -> Result<Goal, GoalError> {
        let rows = self
            .gateway
            .select(tables::GOALS, &Query::new().eq("id", goal_id))
            .await?;
        single(rows, format!("goal {}", goal_id))
    }

    pub async fn create_goal(&self, user_id: Uuid, draft: &GoalDraft) -> Result<Goal, GoalError> {
        let row = json!({
            "user_id": user_id,
            "title": draft.title,
            "description": draft.description,
            "due_date": draft.due_date,
            "priority": draft.priority,
            "is_completed": false,
        });
        let rows = self.gateway.insert(tables::GOALS, vec![row]).await?;
        single(rows, "created goal".to_string()).map_err(|e| match e {
            GoalError::NotFound(_) => GoalError::Decode("insert returned no rows".to_string()),
            other => other,
        })
    }

    pub async fn update_goal(&self, goal_id: Uuid, patch: &GoalPatch) -> Result<Goal, GoalError> {
        let rows = self
            .gateway
            .update(
                tables::GOALS,
                &Query::new().eq("id", goal_id),
                serde_json::to_value(patch)?,
            )
            .await?;
        single(rows, format!("goal {}", goal_id))
    }

    pub async fn delete_goal(&self, goal_id: Uuid) -> Result<(), GoalError> {
        let rows = self
            .gateway
            .delete(tables::GOALS, &Query::new().eq("id", goal_id))
            .await?;
        if rows.is_empty() {
            return Err(GoalError::NotFound(format!("goal {}", goal_id)));
        }
        Ok(())
    }

    /// Oldest first.
    pub async fn list_steps(&self, goal_id: Uuid) -> Result<Vec<GoalStep>, GoalError> {
        let query = Query::new()
            .eq("goal_id", goal_id)
            .order("created_at", Direction::Ascending);
        tracing::debug!(%goal_id, "selecting steps");
        decode_rows(self.gateway.select(tables::GOAL_STEPS, &query).await?)
    }

    /// Insert every draft in one call.
    pub async fn create_steps(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
        drafts: &[StepDraft],
    ) -> Result<Vec<GoalStep>, GoalError> {
        let rows = drafts
            .iter()
            .map(|draft| {
                json!({
                    "goal_id": goal_id,
                    "user_id": user_id,
                    "title": draft.title,
                    "step_order": draft.step_order,
                    "is_completed": false,
                })
            })
            .collect();
        decode_rows(self.gateway.insert(tables::GOAL_STEPS, rows).await?)
    }

    pub async fn update_step(
        &self,
        goal_id: Uuid,
        step_id: Uuid,
        patch: &StepPatch,
    ) -> Result<GoalStep, GoalError> {
        let query = Query::new().eq("id", step_id).eq("goal_id", goal_id);
        let rows = self
            .gateway
            .update(tables::GOAL_STEPS, &query, serde_json::to_value(patch)?)
            .await?;
        single(rows, format!("step {}", step_id))
    }

    pub async fn delete_step(&self, goal_id: Uuid, step_id: Uuid) -> Result<(), GoalError> {
        let query = Query::new().eq("id", step_id).eq("goal_id", goal_id);
        let rows = self.gateway.delete(tables::GOAL_STEPS, &query).await?;
        if rows.is_empty() {
            return Err(GoalError::NotFound(format!("step {}", step_id)));
        }
        Ok(())
    }
}
