//! # mentor-gateway
//!
//! Contracts and adapters for the two remote services Lifelong Mentor
//! depends on: the backend data gateway (auth, tables, object storage) and
//! the step-suggestion gateway (generative AI).
//!
//! ## Key components
//!
//! - [`DataGateway`] — auth session + auth events, table CRUD, object storage
//! - [`Query`] — equality filters and ordering for table calls
//! - [`RestGateway`] — Supabase-compatible REST adapter
//! - [`MemoryGateway`] — in-process adapter with row ownership rules
//! - [`SuggestionGateway`] — step suggestions for a goal
//! - [`GeminiGateway`] / [`StaticSuggestions`] — remote and canned suggestion sources

pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod gemini;
pub mod memory;
pub mod query;
pub mod rest;
pub mod suggestion;

pub use auth::{AuthEvent, Credentials, Session, User};
pub use config::{GatewayConfig, SuggestionConfig};
pub use data::{tables, DataGateway, AVATAR_BUCKET};
pub use error::{GatewayError, Result};
pub use gemini::GeminiGateway;
pub use memory::MemoryGateway;
pub use query::{Direction, Order, Query};
pub use rest::RestGateway;
pub use suggestion::{StaticSuggestions, StepSuggestion, SuggestionError, SuggestionGateway};
