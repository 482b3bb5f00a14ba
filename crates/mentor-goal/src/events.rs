// events.rs — Goal activity events and notification dispatch.
//
// The goal store emits an event after each confirmed change. Sinks decide
// what to do with them; the built-in LogSink appends JSONL to a file. Sink
// failures are logged and never fail the store operation.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SinkError;

/// Activity on a user's goals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum GoalEvent {
    GoalCreated {
        goal_id: Uuid,
        title: String,
        timestamp: DateTime<Utc>,
    },

    /// Fields other than completion changed.
    GoalUpdated {
        goal_id: Uuid,
        fields: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    GoalCompletionChanged {
        goal_id: Uuid,
        completed: bool,
        timestamp: DateTime<Utc>,
    },

    GoalDeleted {
        goal_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    StepAdded {
        goal_id: Uuid,
        step_id: Uuid,
        title: String,
        timestamp: DateTime<Utc>,
    },

    StepDeleted {
        goal_id: Uuid,
        step_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// Suggested steps were inserted in one batch.
    StepsGenerated {
        goal_id: Uuid,
        count: usize,
        timestamp: DateTime<Utc>,
    },
}

impl GoalEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            GoalEvent::GoalCreated { .. } => "goal_created",
            GoalEvent::GoalUpdated { .. } => "goal_updated",
            GoalEvent::GoalCompletionChanged { .. } => "goal_completion_changed",
            GoalEvent::GoalDeleted { .. } => "goal_deleted",
            GoalEvent::StepAdded { .. } => "step_added",
            GoalEvent::StepDeleted { .. } => "step_deleted",
            GoalEvent::StepsGenerated { .. } => "steps_generated",
        }
    }

    pub fn goal_id(&self) -> Uuid {
        match self {
            GoalEvent::GoalCreated { goal_id, .. }
            | GoalEvent::GoalUpdated { goal_id, .. }
            | GoalEvent::GoalCompletionChanged { goal_id, .. }
            | GoalEvent::GoalDeleted { goal_id, .. }
            | GoalEvent::StepAdded { goal_id, .. }
            | GoalEvent::StepDeleted { goal_id, .. }
            | GoalEvent::StepsGenerated { goal_id, .. } => *goal_id,
        }
    }

    pub fn goal_created(goal_id: Uuid, title: &str) -> Self {
        GoalEvent::GoalCreated {
            goal_id,
            title: title.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Receives goal events.
pub trait NotificationSink: Send + Sync {
    /// Handle an event. Errors are logged but don't stop the caller.
    fn send(&self, event: &GoalEvent) -> Result<(), SinkError>;
}

/// Appends events as JSONL to a file.
pub struct LogSink {
    path: PathBuf,
}

impl LogSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NotificationSink for LogSink {
    fn send(&self, event: &GoalEvent) -> Result<(), SinkError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| SinkError::IoError {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| SinkError::IoError {
                path: self.path.display().to_string(),
                source,
            })?;

        let json = serde_json::to_string(event)?;
        writeln!(file, "{}", json).map_err(|source| SinkError::IoError {
            path: self.path.display().to_string(),
            source,
        })?;

        Ok(())
    }
}

/// Fans events out to every registered sink.
#[derive(Default)]
pub struct EventDispatcher {
    sinks: Vec<Box<dyn NotificationSink>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sink(&mut self, sink: Box<dyn NotificationSink>) {
        self.sinks.push(sink);
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    pub fn dispatch(&self, event: &GoalEvent) {
        for sink in &self.sinks {
            if let Err(e) = sink.send(event) {
                tracing::warn!(event = event.event_type(), "notification sink error: {}", e);
            }
        }
    }
}
