mod cache;
mod global;
mod misc;
mod watch;

#[cfg(test)]
mod tests;

use clap::Command;

pub fn build_cli() -> Command {
    global::root_command()
        .subcommand(watch::watch_command())
        .subcommand(cache::cache_command())
        .subcommand(misc::config_command())
}
