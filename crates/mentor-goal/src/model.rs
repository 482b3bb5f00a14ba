// model.rs — Goal and GoalStep records, plus the drafts and patches that
// create and change them.
//
// Records mirror the `goals` and `goal_steps` rows. Nullable flags from the
// backend read as their defaults. Patches serialize only the fields they
// touch; nullable columns use `Option<Option<T>>` so "clear" (`Some(None)`)
// is distinct from "leave alone" (`None`).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::GoalError;

/// Deserialize `null` (or a missing field, with `#[serde(default)]`) as the
/// type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Stored as `"Low"`, `"Medium"`, `"High"`. Lowercase spellings are accepted on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Priority {
    #[serde(alias = "low")]
    Low,
    #[default]
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "high")]
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        };
        f.write_str(name)
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!(
                "unknown priority '{}' (expected low, medium, or high)",
                other
            )),
        }
    }
}

/// A user's goal.
///
/// `completed_at` is set exactly when `is_completed` is true.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Goal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub due_date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: Priority,

    #[serde(default, deserialize_with = "null_as_default")]
    pub is_completed: bool,

    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

/// One sub-task of a goal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoalStep {
    pub id: Uuid,
    pub goal_id: Uuid,
    pub user_id: Uuid,
    pub title: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub is_completed: bool,

    #[serde(default)]
    pub step_order: Option<i32>,

    pub created_at: DateTime<Utc>,
}

/// Fields for a new goal. The owner is filled in from the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalDraft {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
}

impl GoalDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

/// Partial update of a goal.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct GoalPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<NaiveDate>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

impl GoalPatch {
    /// Mark complete as of `at`, or reopen.
    pub fn completion(completed: bool, at: DateTime<Utc>) -> Self {
        Self {
            is_completed: Some(completed),
            completed_at: Some(completed.then_some(at)),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Check the patch and fill in what the completion invariant implies.
    ///
    /// Setting `is_completed` without `completed_at` stamps or clears it;
    /// `completed_at` may not change on its own or contradict the flag.
    pub fn normalize(mut self, now: DateTime<Utc>) -> Result<Self, GoalError> {
        if self.is_empty() {
            return Err(GoalError::ValidationRejected(
                "goal update changes nothing".to_string(),
            ));
        }
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(GoalError::ValidationRejected(
                "goal title must not be empty".to_string(),
            ));
        }
        match (self.is_completed, self.completed_at) {
            (Some(true), None) => self.completed_at = Some(Some(now)),
            (Some(false), None) => self.completed_at = Some(None),
            (Some(true), Some(Some(_))) | (Some(false), Some(None)) | (None, None) => {}
            (Some(_), Some(_)) => {
                return Err(GoalError::ValidationRejected(
                    "completed_at must be set exactly when the goal is completed".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(GoalError::ValidationRejected(
                    "completed_at can only change together with is_completed".to_string(),
                ))
            }
        }
        Ok(self)
    }
}

/// Fields for a new step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDraft {
    pub title: String,
    pub step_order: Option<i32>,
}

impl StepDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            step_order: None,
        }
    }

    pub fn at(mut self, step_order: i32) -> Self {
        self.step_order = Some(step_order);
        self
    }
}

/// Partial update of a step.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct StepPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_order: Option<Option<i32>>,
}

impl StepPatch {
    pub fn completed(completed: bool) -> Self {
        Self {
            is_completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn validate(&self) -> Result<(), GoalError> {
        if self.is_empty() {
            return Err(GoalError::ValidationRejected(
                "step update changes nothing".to_string(),
            ));
        }
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(GoalError::ValidationRejected(
                "step title must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
