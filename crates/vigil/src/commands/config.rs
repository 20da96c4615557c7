use clap::ArgMatches;
use tracing::{error, info};

use vigil_config::VigilConfig;

pub(crate) fn handle_config_command(
    _matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(event = "cli.config_started");

    // Unlike the other commands, a broken config is reported rather than
    // replaced with defaults.
    let config = match VigilConfig::load_hierarchy() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Could not load config: {}", e);
            error!(event = "cli.config_failed", error = %e);
            return Err(e.into());
        }
    };

    print!("{}", render_config(&config)?);

    info!(event = "cli.config_completed");
    Ok(())
}

fn render_config(config: &VigilConfig) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(&config.effective())
}
