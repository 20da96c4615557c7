//! Configuration validation logic.

use crate::errors::ConfigError;
use crate::types::VigilConfig;

/// Validate a VigilConfig, returning an error if any values are invalid.
///
/// # Validation Rules
///
/// - `refresh.live_interval_ms` must be greater than zero
/// - `retry.delays_ms` must not be empty while retries are enabled
/// - every retry delay must be greater than zero
pub fn validate_config(config: &VigilConfig) -> Result<(), ConfigError> {
    if config.refresh.live_interval_ms() == 0 {
        return Err(ConfigError::InvalidConfiguration {
            message: "refresh.live_interval_ms must be > 0".to_string(),
        });
    }

    let delays = config.retry.delays_ms();
    if config.retry.max_attempts() > 0 && delays.is_empty() {
        return Err(ConfigError::InvalidConfiguration {
            message: format!(
                "retry.delays_ms must not be empty when retry.max_attempts is {}",
                config.retry.max_attempts()
            ),
        });
    }

    if delays.contains(&0) {
        return Err(ConfigError::InvalidConfiguration {
            message: "retry.delays_ms entries must be > 0".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RefreshSettings, RetrySettings};

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&VigilConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_live_interval_rejected() {
        let config = VigilConfig {
            refresh: RefreshSettings {
                live_interval_ms: Some(0),
                ..Default::default()
            },
            ..Default::default()
        };

        let result = validate_config(&config);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidConfiguration { .. })
        ));
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("live_interval_ms")
        );
    }

    #[test]
    fn test_empty_delays_with_retries_rejected() {
        let config = VigilConfig {
            retry: RetrySettings {
                delays_ms: Some(vec![]),
                max_attempts: Some(3),
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_empty_delays_without_retries_allowed() {
        let config = VigilConfig {
            retry: RetrySettings {
                delays_ms: Some(vec![]),
                max_attempts: Some(0),
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_zero_delay_rejected() {
        let config = VigilConfig {
            retry: RetrySettings {
                delays_ms: Some(vec![2000, 0]),
                max_attempts: None,
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }
}
