//! # mentor-state
//!
//! The reactive core shared by the session and goal stores.
//!
//! A [`StateCell`] holds a state value and a list of listeners. Every
//! committed mutation notifies the listeners synchronously with the new
//! state. [`StateCell::subscribe`] hands back a [`Subscription`] that removes
//! the listener when dropped.

pub mod observable;

pub use observable::{StateCell, Subscription};
