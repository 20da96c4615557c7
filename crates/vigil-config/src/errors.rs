#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse config file: {message}")]
    ConfigParseError { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("IO error reading config: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// True when the underlying cause is a missing config file.
    pub fn is_file_not_found(&self) -> bool {
        matches!(
            self,
            ConfigError::IoError { source } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}
