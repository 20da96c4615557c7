use clap::{Arg, ArgAction, Command};

pub fn cache_command() -> Command {
    Command::new("cache")
        .about("Inspect or clear locally cached payloads")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("show")
                .about("Print a cached payload and its age")
                .arg(
                    Arg::new("key")
                        .help("Cache key")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Output in JSON format")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("clear").about("Remove a cached payload").arg(
                Arg::new("key")
                    .help("Cache key")
                    .required(true)
                    .index(1),
            ),
        )
}
