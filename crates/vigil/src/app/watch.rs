use clap::{Arg, ArgAction, Command};

pub fn watch_command() -> Command {
    Command::new("watch")
        .about("Load a panel and keep it refreshed until interrupted")
        .long_about("Shows the locally cached payload first, retries the initial live load, then refreshes on a timer. Send SIGUSR1 to mark the panel hidden and SIGUSR2 to mark it visible again.")
        .arg(
            Arg::new("key")
                .help("Cache key for this panel (e.g. traffic)")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("live")
                .long("live")
                .help("Shell command printing the live payload as JSON")
                .value_name("CMD")
                .required(true),
        )
        .arg(
            Arg::new("cached")
                .long("cached")
                .help("Shell command printing the backend-cached payload as JSON (default: re-read the local cache)")
                .value_name("CMD"),
        )
        .arg(
            Arg::new("interval-ms")
                .long("interval-ms")
                .help("Live refresh interval in milliseconds (overrides config)")
                .value_name("MS")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("timeout-ms")
                .long("timeout-ms")
                .help("Give up on a single fetch command after this long")
                .value_name("MS")
                .default_value("10000")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("hidden")
                .long("hidden")
                .help("Start in the background state")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-refresh")
                .long("no-refresh")
                .help("Disable periodic refresh after the initial load")
                .action(ArgAction::SetTrue)
                .conflicts_with("once"),
        )
        .arg(
            Arg::new("once")
                .long("once")
                .help("Run the initial load, print the result, and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print each update as one JSON line")
                .action(ArgAction::SetTrue),
        )
}
