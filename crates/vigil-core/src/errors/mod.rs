use std::error::Error;

/// Base trait for all application errors
pub trait VigilError: Error + Send + Sync + 'static {
    /// Error code for programmatic handling
    fn error_code(&self) -> &'static str;

    /// Whether this error should be logged as an error or warning
    fn is_user_error(&self) -> bool {
        false
    }
}

/// Common result type for the application
pub type VigilResult<T> = Result<T, Box<dyn VigilError>>;

impl VigilError for vigil_config::ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            vigil_config::ConfigError::ConfigParseError { .. } => "CONFIG_PARSE_ERROR",
            vigil_config::ConfigError::InvalidConfiguration { .. } => "INVALID_CONFIGURATION",
            vigil_config::ConfigError::IoError { .. } => "CONFIG_IO_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            vigil_config::ConfigError::ConfigParseError { .. }
                | vigil_config::ConfigError::InvalidConfiguration { .. }
        )
    }
}
