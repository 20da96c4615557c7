//! Periodic refresh with a single timer per consumer.
//!
//! While the page is visible the live fetch runs every `live_interval`;
//! while hidden the cached fetch runs every [`BACKGROUND_REFRESH_INTERVAL`].
//! Returning to the foreground optionally triggers one debounced live fetch.

mod config;
mod handle;
mod slot;
mod task;

pub use config::{BACKGROUND_REFRESH_INTERVAL, RefreshConfig, VISIBLE_DEBOUNCE_INTERVAL};
pub use handle::{RefreshHandle, RefreshScheduler, Strategy};
pub use slot::{FetchOp, FetchSlot, fetch_op};
