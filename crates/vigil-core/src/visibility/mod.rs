//! Foreground/background signal for one page session.
//!
//! The embedding environment reports changes with [`VisibilityTracker::set`];
//! schedulers read the current value synchronously and react to transitions
//! through either a callback subscription or a `watch` receiver.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityState {
    Visible,
    Hidden,
}

impl VisibilityState {
    pub fn is_visible(self) -> bool {
        self == VisibilityState::Visible
    }
}

impl std::fmt::Display for VisibilityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VisibilityState::Visible => write!(f, "visible"),
            VisibilityState::Hidden => write!(f, "hidden"),
        }
    }
}

type Listener = Arc<dyn Fn(VisibilityState) + Send + Sync>;

struct Inner {
    sender: watch::Sender<VisibilityState>,
    listeners: Mutex<HashMap<u64, Listener>>,
    next_id: AtomicU64,
}

/// Cheap to clone; clones observe the same signal.
#[derive(Clone)]
pub struct VisibilityTracker {
    inner: Arc<Inner>,
}

impl VisibilityTracker {
    pub fn new(initial: VisibilityState) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            inner: Arc::new(Inner {
                sender,
                listeners: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    pub fn current(&self) -> VisibilityState {
        *self.inner.sender.borrow()
    }

    pub fn is_visible(&self) -> bool {
        self.current().is_visible()
    }

    /// Report the environment's visibility.
    ///
    /// Returns `true` and notifies subscribers only when the state actually
    /// changed; repeating the current state is a no-op.
    pub fn set(&self, state: VisibilityState) -> bool {
        let changed = self.inner.sender.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });

        if !changed {
            return false;
        }

        tracing::debug!(event = "core.visibility.changed", state = %state);

        // Snapshot so callbacks may subscribe/unsubscribe without deadlocking
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();
        for listener in listeners {
            listener(state);
        }
        true
    }

    /// Register a callback invoked once per genuine transition.
    pub fn subscribe<F>(&self, on_change: F) -> Subscription
    where
        F: Fn(VisibilityState) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, Arc::new(on_change));
        Subscription {
            id,
            tracker: Arc::downgrade(&self.inner),
        }
    }

    /// Async view of the signal. Marks the current value as seen.
    pub fn watch(&self) -> watch::Receiver<VisibilityState> {
        self.inner.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl Default for VisibilityTracker {
    fn default() -> Self {
        Self::new(VisibilityState::Visible)
    }
}

impl std::fmt::Debug for VisibilityTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisibilityTracker")
            .field("state", &self.current())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Handle returned by [`VisibilityTracker::subscribe`]. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    tracker: Weak<Inner>,
}

impl Subscription {
    /// Safe to call more than once.
    pub fn unsubscribe(&self) {
        if let Some(inner) = self.tracker.upgrade() {
            inner
                .listeners
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
