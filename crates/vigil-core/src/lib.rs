//! vigil-core: visibility-aware refresh, local caching and initial-load retry
//!
//! These pieces keep a dashboard panel current without hammering its backend:
//!
//! - [`visibility`] - Foreground/background state with change subscriptions
//! - [`scheduler`] - One live or cached refresh timer per consumer
//! - [`cache`] - Last-good payload per key, never fails the caller
//! - [`retry`] - Bounded retries for the first load of a view
//! - [`consumer`] - A panel wiring the above to a data source

pub mod cache;
pub mod consumer;
pub mod environment;
pub mod errors;
pub mod logging;
pub mod retry;
pub mod scheduler;
pub mod visibility;

pub use cache::{
    CacheEntry, FileStore, KeyValueStore, LocalCacheStore, MemoryStore, StorageError,
};
pub use consumer::{DataSource, FetchError, Freshness, Panel, PanelView};
pub use environment::{Clock, Environment, ManualClock, SystemClock};
pub use errors::{VigilError, VigilResult};
pub use logging::init_logging;
pub use retry::{LoadError, LoadRetryOrchestrator, LoadState, RetrySchedule, Settlement};
pub use scheduler::{RefreshConfig, RefreshHandle, RefreshScheduler, Strategy, fetch_op};
pub use visibility::{Subscription, VisibilityState, VisibilityTracker};

pub use vigil_config::{ConfigError, VigilConfig};
