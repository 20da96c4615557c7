use clap::Command;

pub fn config_command() -> Command {
    Command::new("config").about("Print the effective configuration as TOML")
}
