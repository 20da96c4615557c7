//! # vigil-config
//!
//! TOML configuration types, loading, and validation for vigil.
//!
//! Depends only on `vigil-paths`.

mod defaults;
mod loading;
mod validation;

pub mod errors;
pub mod types;

// Public API re-exports
pub use defaults::{DEFAULT_LIVE_INTERVAL_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAYS_MS};
pub use errors::ConfigError;
pub use loading::{load_config_file, load_hierarchy, load_hierarchy_from, merge_configs};
pub use types::{CacheSettings, RefreshSettings, RetrySettings, VigilConfig};
pub use validation::validate_config;

impl VigilConfig {
    /// Load configuration from the hierarchy of config files.
    ///
    /// See [`loading::load_hierarchy`] for details.
    pub fn load_hierarchy() -> Result<Self, ConfigError> {
        loading::load_hierarchy()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate_config(self)
    }
}
