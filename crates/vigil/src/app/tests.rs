use super::*;

#[test]
fn test_cli_build() {
    let app = build_cli();
    assert_eq!(app.get_name(), "vigil");
}

#[test]
fn test_cli_watch_command() {
    let app = build_cli();
    let matches = app.try_get_matches_from(vec![
        "vigil",
        "watch",
        "traffic",
        "--live",
        "curl -s https://stats.example/traffic",
        "--interval-ms",
        "5000",
    ]);
    assert!(matches.is_ok());

    let matches = matches.unwrap();
    let watch_matches = matches.subcommand_matches("watch").unwrap();
    assert_eq!(watch_matches.get_one::<String>("key").unwrap(), "traffic");
    assert_eq!(
        watch_matches.get_one::<String>("live").unwrap(),
        "curl -s https://stats.example/traffic"
    );
    assert_eq!(*watch_matches.get_one::<u64>("interval-ms").unwrap(), 5000);
    assert_eq!(*watch_matches.get_one::<u64>("timeout-ms").unwrap(), 10000);
    assert!(watch_matches.get_one::<String>("cached").is_none());
    assert!(!watch_matches.get_flag("hidden"));
    assert!(!watch_matches.get_flag("once"));
}

#[test]
fn test_cli_watch_requires_live() {
    let app = build_cli();
    let matches = app.try_get_matches_from(vec!["vigil", "watch", "traffic"]);
    assert!(matches.is_err());
}

#[test]
fn test_cli_watch_rejects_zero_interval() {
    let app = build_cli();
    let matches = app.try_get_matches_from(vec![
        "vigil",
        "watch",
        "traffic",
        "--live",
        "true",
        "--interval-ms",
        "0",
    ]);
    assert!(matches.is_err());
}

#[test]
fn test_cli_watch_once_conflicts_with_no_refresh() {
    let app = build_cli();
    let matches = app.try_get_matches_from(vec![
        "vigil",
        "watch",
        "traffic",
        "--live",
        "true",
        "--once",
        "--no-refresh",
    ]);
    assert!(matches.is_err());
}

#[test]
fn test_cli_watch_flags() {
    let app = build_cli();
    let matches = app.try_get_matches_from(vec![
        "vigil", "watch", "traffic", "--live", "true", "--cached", "cat snap.json", "--hidden",
        "--once", "--json",
    ]);
    assert!(matches.is_ok());

    let matches = matches.unwrap();
    let watch_matches = matches.subcommand_matches("watch").unwrap();
    assert_eq!(
        watch_matches.get_one::<String>("cached").unwrap(),
        "cat snap.json"
    );
    assert!(watch_matches.get_flag("hidden"));
    assert!(watch_matches.get_flag("once"));
    assert!(watch_matches.get_flag("json"));
}

#[test]
fn test_cli_cache_show_json() {
    let app = build_cli();
    let matches = app.try_get_matches_from(vec!["vigil", "cache", "show", "traffic", "--json"]);
    assert!(matches.is_ok());

    let matches = matches.unwrap();
    let cache_matches = matches.subcommand_matches("cache").unwrap();
    let show_matches = cache_matches.subcommand_matches("show").unwrap();
    assert_eq!(show_matches.get_one::<String>("key").unwrap(), "traffic");
    assert!(show_matches.get_flag("json"));
}

#[test]
fn test_cli_cache_clear() {
    let app = build_cli();
    let matches = app.try_get_matches_from(vec!["vigil", "cache", "clear", "traffic"]);
    assert!(matches.is_ok());

    let matches = matches.unwrap();
    let cache_matches = matches.subcommand_matches("cache").unwrap();
    assert!(cache_matches.subcommand_matches("clear").is_some());
}

#[test]
fn test_cli_cache_requires_subcommand() {
    let app = build_cli();
    let matches = app.try_get_matches_from(vec!["vigil", "cache"]);
    assert!(matches.is_err());
}

#[test]
fn test_cli_verbose_is_global() {
    let app = build_cli();
    let matches = app.try_get_matches_from(vec!["vigil", "config", "-v"]);
    assert!(matches.is_ok());
    assert!(matches.unwrap().get_flag("verbose"));
}
