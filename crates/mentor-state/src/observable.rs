// observable.rs — StateCell: shared state with synchronous change notification.
//
// Listeners run after the write lock is released, so a listener may read or
// even update the cell it observes. Notification order follows subscription
// order. A listener sees the state as committed by the mutation that
// triggered it; if it mutates the cell itself, later listeners may observe
// that newer state on the follow-up notification.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

type Listener<S> = Arc<dyn Fn(&S) + Send + Sync>;

struct Shared<S> {
    state: RwLock<S>,
    listeners: Mutex<Vec<(u64, Listener<S>)>>,
    next_id: AtomicU64,
}

impl<S> Shared<S> {
    fn listeners(&self) -> Vec<Listener<S>> {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    fn remove(&self, id: u64) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(listener_id, _)| *listener_id != id);
    }
}

/// A cloneable handle to shared, observable state.
///
/// Clones share the same state and listeners.
pub struct StateCell<S> {
    shared: Arc<Shared<S>>,
}

impl<S> Clone for StateCell<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: Default + Clone + Send + Sync + 'static> Default for StateCell<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S: Clone + Send + Sync + 'static> StateCell<S> {
    pub fn new(initial: S) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(initial),
                listeners: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> S {
        self.read(S::clone)
    }

    /// Borrow the current state.
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let state = self
            .shared
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Mutate the state, then notify every listener with the result.
    pub fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut state = self
            .shared
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let result = f(&mut state);

        let listeners = self.shared.listeners();
        if listeners.is_empty() {
            return result;
        }
        let committed = state.clone();
        drop(state);

        for listener in listeners {
            listener(&committed);
        }
        result
    }

    /// Register a listener. It stays registered while the returned handle lives.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        self.shared
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));

        let shared: Weak<Shared<S>> = Arc::downgrade(&self.shared);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(shared) = shared.upgrade() {
                    shared.remove(id);
                }
            })),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Handle returned by [`StateCell::subscribe`].
///
/// Dropping it unsubscribes. Use [`Subscription::detach`] to keep the
/// listener for the lifetime of the cell.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
