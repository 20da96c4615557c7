//! Configuration loading and merging logic.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.vigil/config.toml` (global user preferences)
//! 3. **Project config** - `./.vigil/config.toml` (project-specific overrides)
//! 4. **CLI arguments** - Command-line flags (highest priority)

use crate::errors::ConfigError;
use crate::types::{CacheSettings, RefreshSettings, RetrySettings, VigilConfig};
use crate::validation::validate_config;
use std::fs;
use std::path::Path;
use vigil_paths::VigilPaths;

/// Load configuration from the hierarchy of config files.
///
/// # Errors
///
/// Returns an error if a config file fails to parse or validation fails.
/// Missing config files are not errors.
pub fn load_hierarchy() -> Result<VigilConfig, ConfigError> {
    let paths = VigilPaths::resolve().map_err(|e| ConfigError::InvalidConfiguration {
        message: e.to_string(),
    })?;
    let project_root = std::env::current_dir()?;
    load_hierarchy_from(
        &paths.user_config(),
        &VigilPaths::project_config(&project_root),
    )
}

/// Load and merge the user and project config files at explicit paths.
pub fn load_hierarchy_from(
    user_path: &Path,
    project_path: &Path,
) -> Result<VigilConfig, ConfigError> {
    let mut config = VigilConfig::default();

    for path in [user_path, project_path] {
        match load_config_file(path) {
            Ok(layer) => config = merge_configs(config, layer),
            Err(e) if e.is_file_not_found() => {
                tracing::debug!(
                    event = "config.load.file_missing",
                    path = %path.display()
                );
            }
            Err(e) => return Err(e),
        }
    }

    validate_config(&config)?;

    Ok(config)
}

/// Load a configuration file from the given path.
pub fn load_config_file(path: &Path) -> Result<VigilConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| ConfigError::ConfigParseError {
        message: format!("'{}': {}", path.display(), e),
    })
}

/// Merge two configurations, with override_config taking precedence.
///
/// Override values replace base values only if present.
pub fn merge_configs(base: VigilConfig, override_config: VigilConfig) -> VigilConfig {
    VigilConfig {
        refresh: RefreshSettings::merge(&base.refresh, &override_config.refresh),
        retry: RetrySettings::merge(&base.retry, &override_config.retry),
        cache: CacheSettings::merge(&base.cache, &override_config.cache),
    }
}
