//! # mentor-session
//!
//! Who is signed in, and what we know about them.
//!
//! ## Key components
//!
//! - [`SessionStore`] — observable session, user, profile, and loading flag
//! - [`AuthService`] — sign-up, sign-in, sign-out, session restore
//! - [`ProfileService`] — profile fetch, upsert, and avatar upload
//! - [`SessionListener`] — pushes gateway auth events into the store
//! - [`OnboardingFlow`] — the Welcome → Profile wizard that marks onboarding complete

pub mod auth;
pub mod error;
pub mod listener;
pub mod onboarding;
pub mod profile;
pub mod store;

pub use auth::AuthService;
pub use error::{OnboardingError, SessionError};
pub use listener::SessionListener;
pub use onboarding::{OnboardingFlow, OnboardingStep};
pub use profile::{Profile, ProfileService, ProfileUpdate};
pub use store::{SessionState, SessionStore};
