//! Default values for configuration fields.
//!
//! Every field in the TOML types is optional so that user and project
//! configs can be merged; the accessors below fall back to these values.

/// Live refresh cadence when nothing is configured (30s).
pub const DEFAULT_LIVE_INTERVAL_MS: u64 = 30_000;

/// Initial-load retry waits: 2s before the first retry, 3s before the second.
pub const DEFAULT_RETRY_DELAYS_MS: [u64; 2] = [2_000, 3_000];

/// Retries after the first attempt (three invocations in total).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;
