use std::time::Duration;
use vigil_config::RefreshSettings;

/// Cached-fetch cadence while the page is hidden. Not user-configurable.
pub const BACKGROUND_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Delay before the re-sync fetch after returning to the foreground, so a
/// timer armed in the same tick cannot double-fire with it.
pub const VISIBLE_DEBOUNCE_INTERVAL: Duration = Duration::from_millis(100);

/// Per-consumer refresh configuration. Immutable while a scheduler runs;
/// use [`RefreshHandle::restart`](super::RefreshHandle::restart) to change it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshConfig {
    pub enabled: bool,
    pub live_interval: Duration,
    pub immediate: bool,
    pub pause_when_hidden: bool,
    pub refresh_on_visible: bool,
    background_interval: Duration,
}

impl RefreshConfig {
    pub fn new(live_interval: Duration) -> Self {
        Self {
            enabled: true,
            live_interval,
            immediate: true,
            pause_when_hidden: true,
            refresh_on_visible: true,
            background_interval: BACKGROUND_REFRESH_INTERVAL,
        }
    }

    pub fn disabled() -> Self {
        Self::default().with_enabled(false)
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    pub fn with_pause_when_hidden(mut self, pause_when_hidden: bool) -> Self {
        self.pause_when_hidden = pause_when_hidden;
        self
    }

    pub fn with_refresh_on_visible(mut self, refresh_on_visible: bool) -> Self {
        self.refresh_on_visible = refresh_on_visible;
        self
    }

    pub fn background_interval(&self) -> Duration {
        self.background_interval
    }

    /// Whether a Hidden→Visible transition schedules the debounced live fetch.
    pub fn resyncs_on_visible(&self) -> bool {
        self.enabled && self.pause_when_hidden && self.refresh_on_visible
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self::new(Duration::from_millis(vigil_config::DEFAULT_LIVE_INTERVAL_MS))
    }
}

impl From<&RefreshSettings> for RefreshConfig {
    fn from(settings: &RefreshSettings) -> Self {
        Self::new(Duration::from_millis(settings.live_interval_ms()))
            .with_enabled(settings.enabled())
            .with_immediate(settings.immediate())
            .with_pause_when_hidden(settings.pause_when_hidden())
            .with_refresh_on_visible(settings.refresh_on_visible())
    }
}
