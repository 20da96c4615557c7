use clap::{Arg, ArgAction, Command};

pub fn root_command() -> Command {
    Command::new("vigil")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Keep a polled data panel fresh without hammering its backend")
        .long_about("vigil runs a data command on a schedule, caches the last good result locally, and falls back to that cache when the backend is down. While backgrounded it switches to a cheaper cached fetch at a slower cadence.")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
}
