use tracing::warn;

use vigil_config::VigilConfig;
use vigil_core::Environment;
use vigil_paths::VigilPaths;

/// Load configuration with warning on errors.
///
/// Falls back to defaults if config loading fails, but notifies the user via:
/// - stderr message for immediate visibility
/// - structured log event `cli.config.load_failed` for debugging
pub fn load_config_with_warning() -> VigilConfig {
    match VigilConfig::load_hierarchy() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Could not load config: {}. Using defaults.\n\
                 Tip: Check ~/.vigil/config.toml and ./.vigil/config.toml for syntax errors.",
                e
            );
            warn!(
                event = "cli.config.load_failed",
                error = %e,
                "Config load failed, using defaults"
            );
            VigilConfig::default()
        }
    }
}

/// Environment over the on-disk cache (`~/.vigil/cache` unless configured).
pub fn file_backed_environment(
    config: &VigilConfig,
) -> Result<Environment, Box<dyn std::error::Error>> {
    let paths = VigilPaths::resolve()?;
    Ok(Environment::file_backed(&config.cache, &paths))
}

/// Cache keys become file names after encoding, so only reject the
/// unusable ones.
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty() && key.len() <= 200 && !key.chars().any(char::is_control)
}

/// Human-readable age: `42s`, `5m 3s`, `2h 10m`, `3d 4h`.
pub fn format_age(age: chrono::Duration) -> String {
    let secs = age.num_seconds().max(0);
    let (days, hours, minutes, seconds) = (
        secs / 86_400,
        (secs % 86_400) / 3_600,
        (secs % 3_600) / 60,
        secs % 60,
    );

    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Print a JSON error object to stdout and return it boxed.
pub fn print_json_error(message: &str, code: &str) -> Box<dyn std::error::Error> {
    let body = serde_json::json!({ "error": message, "code": code });
    println!("{}", body);
    message.into()
}
