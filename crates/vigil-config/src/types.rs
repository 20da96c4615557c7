use crate::defaults::{DEFAULT_LIVE_INTERVAL_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAYS_MS};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration as read from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VigilConfig {
    #[serde(default)]
    pub refresh: RefreshSettings,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub cache: CacheSettings,
}

impl VigilConfig {
    /// A copy with every unset key filled in with its default.
    pub fn effective(&self) -> Self {
        Self {
            refresh: RefreshSettings {
                enabled: Some(self.refresh.enabled()),
                live_interval_ms: Some(self.refresh.live_interval_ms()),
                immediate: Some(self.refresh.immediate()),
                pause_when_hidden: Some(self.refresh.pause_when_hidden()),
                refresh_on_visible: Some(self.refresh.refresh_on_visible()),
            },
            retry: RetrySettings {
                delays_ms: Some(self.retry.delays_ms()),
                max_attempts: Some(self.retry.max_attempts()),
            },
            cache: self.cache.clone(),
        }
    }
}

/// Periodic refresh settings.
///
/// The background (hidden) cadence is a fixed system constant and has no
/// key here; unknown keys are rejected so a stray `background_interval_ms`
/// fails loudly instead of being ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefreshSettings {
    /// Whether periodic refresh runs at all. Default: true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Live refresh interval in milliseconds while visible.
    /// Default: 30000.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_interval_ms: Option<u64>,

    /// Fire one live fetch as soon as the scheduler starts. Default: true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub immediate: Option<bool>,

    /// Default: true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_when_hidden: Option<bool>,

    /// Re-sync with one live fetch when returning to the foreground.
    /// Default: true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_on_visible: Option<bool>,
}

impl RefreshSettings {
    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn live_interval_ms(&self) -> u64 {
        self.live_interval_ms.unwrap_or(DEFAULT_LIVE_INTERVAL_MS)
    }

    pub fn immediate(&self) -> bool {
        self.immediate.unwrap_or(true)
    }

    pub fn pause_when_hidden(&self) -> bool {
        self.pause_when_hidden.unwrap_or(true)
    }

    pub fn refresh_on_visible(&self) -> bool {
        self.refresh_on_visible.unwrap_or(true)
    }

    pub fn merge(base: &Self, override_config: &Self) -> Self {
        Self {
            enabled: override_config.enabled.or(base.enabled),
            live_interval_ms: override_config.live_interval_ms.or(base.live_interval_ms),
            immediate: override_config.immediate.or(base.immediate),
            pause_when_hidden: override_config.pause_when_hidden.or(base.pause_when_hidden),
            refresh_on_visible: override_config
                .refresh_on_visible
                .or(base.refresh_on_visible),
        }
    }
}

/// Initial-load retry policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Wait before each retry, in milliseconds. The last value is reused
    /// when there are more retries than delays.
    /// Default: [2000, 3000].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delays_ms: Option<Vec<u64>>,

    /// Retries after the first attempt. Default: 2.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
}

impl RetrySettings {
    pub fn delays_ms(&self) -> Vec<u64> {
        self.delays_ms
            .clone()
            .unwrap_or_else(|| DEFAULT_RETRY_DELAYS_MS.to_vec())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS)
    }

    pub fn merge(base: &Self, override_config: &Self) -> Self {
        Self {
            delays_ms: override_config
                .delays_ms
                .clone()
                .or_else(|| base.delays_ms.clone()),
            max_attempts: override_config.max_attempts.or(base.max_attempts),
        }
    }
}

/// Local cache location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Override for the cache directory. Default: `~/.vigil/cache`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl CacheSettings {
    pub fn merge(base: &Self, override_config: &Self) -> Self {
        Self {
            dir: override_config.dir.clone().or_else(|| base.dir.clone()),
        }
    }
}
