//! The explicit environment every scheduler and cache is built from.
//!
//! Visibility, storage, and wall-clock time are passed in as values rather
//! than read from process globals, so tests can drive each one directly.
//! Timers come from the tokio runtime; pausing its clock makes them
//! deterministic.

use crate::cache::{FileStore, KeyValueStore, LocalCacheStore, MemoryStore};
use crate::visibility::{VisibilityState, VisibilityTracker};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use vigil_config::CacheSettings;
use vigil_paths::VigilPaths;

/// Source of wall-clock timestamps (used for `captured_at`).
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Visibility source, storage source, and clock for one page session.
#[derive(Clone)]
pub struct Environment {
    visibility: VisibilityTracker,
    storage: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl Environment {
    pub fn new(
        visibility: VisibilityTracker,
        storage: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            visibility,
            storage,
            clock,
        }
    }

    /// Visible page, unbounded in-memory storage, system clock.
    pub fn in_memory() -> Self {
        Self::new(
            VisibilityTracker::new(VisibilityState::Visible),
            Arc::new(MemoryStore::new()),
            Arc::new(SystemClock),
        )
    }

    /// Visible page, file storage under the configured cache directory
    /// (default `~/.vigil/cache`), system clock.
    pub fn file_backed(settings: &CacheSettings, paths: &VigilPaths) -> Self {
        let dir = settings.dir.clone().unwrap_or_else(|| paths.cache_dir());
        Self::new(
            VisibilityTracker::new(VisibilityState::Visible),
            Arc::new(FileStore::new(dir)),
            Arc::new(SystemClock),
        )
    }

    pub fn visibility(&self) -> &VisibilityTracker {
        &self.visibility
    }

    pub fn storage(&self) -> &Arc<dyn KeyValueStore> {
        &self.storage
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// A cache store backed by this environment's storage and clock.
    pub fn cache(&self) -> LocalCacheStore {
        LocalCacheStore::new(self.storage.clone(), self.clock.clone())
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("visibility", &self.visibility.current())
            .finish_non_exhaustive()
    }
}
