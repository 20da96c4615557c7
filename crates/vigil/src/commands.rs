use clap::ArgMatches;
use tracing::{error, info};

mod cache;
mod config;
mod helpers;
mod signals;
mod source;
mod watch;

use cache::handle_cache_command;
use config::handle_config_command;
use watch::handle_watch_command;

pub fn run_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        event = "cli.app_started",
        version = env!("CARGO_PKG_VERSION")
    );

    match matches.subcommand() {
        Some(("watch", sub_matches)) => handle_watch_command(sub_matches),
        Some(("cache", sub_matches)) => handle_cache_command(sub_matches),
        Some(("config", sub_matches)) => handle_config_command(sub_matches),
        _ => {
            error!(event = "cli.command_unknown");
            Err("Unknown command".into())
        }
    }
}
