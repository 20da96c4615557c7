use std::time::Duration;
use vigil_config::RetrySettings;

/// Waits between initial-load attempts plus the retry budget.
///
/// `max_attempts` counts retries, so a load makes at most
/// `max_attempts + 1` calls. When there are more retries than delays the
/// last delay is reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrySchedule {
    delays: Vec<Duration>,
    max_attempts: u32,
}

impl RetrySchedule {
    pub fn new(delays: Vec<Duration>, max_attempts: u32) -> Self {
        Self {
            delays,
            max_attempts,
        }
    }

    pub fn from_millis(delays_ms: &[u64], max_attempts: u32) -> Self {
        Self::new(
            delays_ms.iter().copied().map(Duration::from_millis).collect(),
            max_attempts,
        )
    }

    /// Load once, never retry.
    pub fn no_retry() -> Self {
        Self::new(Vec::new(), 0)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn total_attempts(&self) -> u32 {
        self.max_attempts.saturating_add(1)
    }

    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    /// Wait before retry number `retry_index` (0-based).
    pub fn delay_for(&self, retry_index: u32) -> Duration {
        self.delays
            .get(retry_index as usize)
            .or(self.delays.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }
}

impl From<&RetrySettings> for RetrySchedule {
    fn from(settings: &RetrySettings) -> Self {
        Self::from_millis(&settings.delays_ms(), settings.max_attempts())
    }
}

impl Default for RetrySchedule {
    fn default() -> Self {
        Self::from_millis(&vigil_config::DEFAULT_RETRY_DELAYS_MS, vigil_config::DEFAULT_MAX_ATTEMPTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let schedule = RetrySchedule::default();
        assert_eq!(schedule.max_attempts(), 2);
        assert_eq!(schedule.total_attempts(), 3);
        assert_eq!(schedule.delay_for(0), Duration::from_millis(2000));
        assert_eq!(schedule.delay_for(1), Duration::from_millis(3000));
    }

    #[test]
    fn test_last_delay_is_reused() {
        let schedule = RetrySchedule::from_millis(&[100, 250], 5);
        assert_eq!(schedule.delay_for(4), Duration::from_millis(250));
    }

    #[test]
    fn test_no_retry() {
        let schedule = RetrySchedule::no_retry();
        assert_eq!(schedule.total_attempts(), 1);
        assert_eq!(schedule.delay_for(0), Duration::ZERO);
    }

    #[test]
    fn test_from_settings_uses_overrides_and_defaults() {
        let settings = RetrySettings {
            delays_ms: Some(vec![500]),
            max_attempts: None,
        };
        let schedule = RetrySchedule::from(&settings);
        assert_eq!(schedule.max_attempts(), 2);
        assert_eq!(schedule.delays(), &[Duration::from_millis(500)]);
        assert_eq!(schedule.delay_for(1), Duration::from_millis(500));
    }
}
