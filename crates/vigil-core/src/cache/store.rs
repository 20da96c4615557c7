//! Last-good payload cache on top of a [`KeyValueStore`].
//!
//! Entries are stored as `{"data": <payload>, "timestamp": "<RFC 3339>"}`.
//! Anything that does not parse into that shape is a miss.

use super::storage::KeyValueStore;
use crate::environment::Clock;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub key: String,
    pub payload: T,
    pub captured_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.captured_at
    }
}

#[derive(Serialize)]
struct StoredEntryRef<'a, T> {
    data: &'a T,
    timestamp: DateTime<Utc>,
}

#[derive(Deserialize)]
struct StoredEntry<T> {
    data: T,
    timestamp: DateTime<Utc>,
}

/// Shared, clonable cache handle. Last writer wins per key.
#[derive(Clone)]
pub struct LocalCacheStore {
    storage: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl LocalCacheStore {
    pub fn new(storage: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Store `payload` captured now.
    ///
    /// Never fails: serialization and storage errors are logged and the
    /// write is dropped. Returns whether the entry was stored.
    pub fn write<T: Serialize>(&self, key: &str, payload: &T) -> bool {
        let captured_at = self.clock.now();
        let encoded = match serde_json::to_string(&StoredEntryRef {
            data: payload,
            timestamp: captured_at,
        }) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(
                    event = "core.cache.encode_failed",
                    key = key,
                    error = %e
                );
                return false;
            }
        };

        match self.storage.set(key, &encoded) {
            Ok(()) => {
                debug!(
                    event = "core.cache.write_completed",
                    key = key,
                    bytes = encoded.len(),
                    captured_at = %captured_at
                );
                true
            }
            Err(e) => {
                warn!(
                    event = "core.cache.write_failed",
                    key = key,
                    error = %e,
                    "Cache write skipped"
                );
                false
            }
        }
    }

    /// The last stored entry for `key`, or `None` when absent or unreadable.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        let raw = match self.storage.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(
                    event = "core.cache.read_failed",
                    key = key,
                    error = %e
                );
                return None;
            }
        };

        match serde_json::from_str::<StoredEntry<T>>(&raw) {
            Ok(stored) => Some(CacheEntry {
                key: key.to_string(),
                payload: stored.data,
                captured_at: stored.timestamp,
            }),
            Err(e) => {
                debug!(
                    event = "core.cache.entry_malformed",
                    key = key,
                    error = %e,
                    "Treating unparsable entry as a miss"
                );
                None
            }
        }
    }

    /// Remove the entry for `key`; absent keys are fine.
    pub fn clear(&self, key: &str) {
        if let Err(e) = self.storage.remove(key) {
            warn!(
                event = "core.cache.clear_failed",
                key = key,
                error = %e
            );
        }
    }
}

impl std::fmt::Debug for LocalCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCacheStore").finish_non_exhaustive()
    }
}
