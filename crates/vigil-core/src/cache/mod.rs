//! Per-key persistence of the last good payload.

mod storage;
mod store;

pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use store::{CacheEntry, LocalCacheStore};
