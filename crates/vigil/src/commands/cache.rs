use chrono::{DateTime, Utc};
use clap::ArgMatches;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use super::helpers::{
    file_backed_environment, format_age, is_valid_key, load_config_with_warning,
    print_json_error,
};

#[derive(Serialize)]
struct CacheShowOutput<'a> {
    key: &'a str,
    captured_at: DateTime<Utc>,
    age_secs: i64,
    data: &'a Value,
}

pub(crate) fn handle_cache_command(
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    match matches.subcommand() {
        Some(("show", sub_matches)) => handle_show_command(sub_matches),
        Some(("clear", sub_matches)) => handle_clear_command(sub_matches),
        _ => {
            error!(event = "cli.cache.subcommand_unknown");
            Err("Unknown cache subcommand".into())
        }
    }
}

fn handle_show_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let key = matches
        .get_one::<String>("key")
        .ok_or("Key argument is required")?;
    let json_output = matches.get_flag("json");

    if !is_valid_key(key) {
        eprintln!("❌ Invalid cache key: {:?}", key);
        return Err("Invalid cache key".into());
    }

    info!(event = "cli.cache.show_started", key = %key);

    let config = load_config_with_warning();
    let env = file_backed_environment(&config)?;

    let Some(entry) = env.cache().read::<Value>(key) else {
        warn!(event = "cli.cache.show_missing", key = %key);
        let message = format!("No cached data for '{}'", key);
        if json_output {
            return Err(print_json_error(&message, "CACHE_ENTRY_NOT_FOUND"));
        }
        eprintln!("❌ {}", message);
        return Err(message.into());
    };

    let age = entry.age(env.clock().now());
    if json_output {
        let output = CacheShowOutput {
            key,
            captured_at: entry.captured_at,
            age_secs: age.num_seconds(),
            data: &entry.payload,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Key:      {}", key);
        println!(
            "Captured: {} ({} ago)",
            entry.captured_at.format("%Y-%m-%d %H:%M:%S UTC"),
            format_age(age)
        );
        println!("{}", serde_json::to_string_pretty(&entry.payload)?);
    }

    info!(event = "cli.cache.show_completed", key = %key);
    Ok(())
}

fn handle_clear_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let key = matches
        .get_one::<String>("key")
        .ok_or("Key argument is required")?;

    if !is_valid_key(key) {
        eprintln!("❌ Invalid cache key: {:?}", key);
        return Err("Invalid cache key".into());
    }

    info!(event = "cli.cache.clear_started", key = %key);

    let config = load_config_with_warning();
    let env = file_backed_environment(&config)?;
    env.cache().clear(key);

    println!("✅ Cleared cache entry '{}'", key);
    info!(event = "cli.cache.clear_completed", key = %key);
    Ok(())
}
