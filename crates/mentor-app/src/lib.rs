//! # mentor-app
//!
//! Configuration and wiring for Lifelong Mentor front ends.
//!
//! - [`AppConfig`] — `mentor.toml` plus environment overrides
//! - [`AppContext`] — one data gateway, one suggestion gateway, and the
//!   session and goal stores built over them

pub mod config;
pub mod context;
pub mod error;

pub use config::{AppConfig, SupabaseSettings};
pub use context::AppContext;
pub use error::{AppError, ConfigError};
