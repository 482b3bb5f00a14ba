//! # mentor-goal
//!
//! Personal goals and their steps for Lifelong Mentor.
//!
//! The [`GoalStore`] is the single place goal data is changed: it calls the
//! backend through the data gateway, asks the suggestion gateway for step
//! ideas, and reconciles confirmed results into observable local state.
//!
//! ## Key components
//!
//! - [`Goal`], [`GoalStep`] — records mirroring the backend rows
//! - [`GoalPatch`], [`StepPatch`] — partial updates with tri-state nullable fields
//! - [`GoalService`] — typed table calls over [`mentor_gateway::DataGateway`]
//! - [`GoalStore`] — cached goals and steps with loading and error state
//! - [`GoalEvent`] — activity emitted after confirmed changes
//! - [`EventDispatcher`] — dispatches events to notification sinks

pub mod error;
pub mod events;
pub mod model;
pub mod service;
pub mod store;

pub use error::{GoalError, SinkError};
pub use events::{EventDispatcher, GoalEvent, LogSink, NotificationSink};
pub use model::{Goal, GoalDraft, GoalPatch, GoalStep, Priority, StepDraft, StepPatch};
pub use service::GoalService;
pub use store::{GoalState, GoalStore};
