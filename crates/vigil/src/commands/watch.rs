use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::ArgMatches;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use vigil_core::{
    Freshness, LoadRetryOrchestrator, Panel, PanelView, RefreshConfig, RetrySchedule, Settlement,
    VisibilityState, VisibilityTracker,
};

use super::helpers::{file_backed_environment, is_valid_key, load_config_with_warning};
use super::signals::{forward_visibility_signals, wait_for_shutdown_signal};
use super::source::{CommandSource, DEFAULT_FETCH_TIMEOUT};

#[derive(Debug, Clone, Copy)]
struct WatchOptions {
    once: bool,
    json: bool,
}

pub(crate) fn handle_watch_command(
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let key = matches
        .get_one::<String>("key")
        .ok_or("Key argument is required")?
        .clone();
    let live = matches
        .get_one::<String>("live")
        .ok_or("--live is required")?
        .clone();
    let cached = matches.get_one::<String>("cached").cloned();
    let interval_ms = matches.get_one::<u64>("interval-ms").copied();
    let timeout = matches
        .get_one::<u64>("timeout-ms")
        .map(|ms| Duration::from_millis(*ms))
        .unwrap_or(DEFAULT_FETCH_TIMEOUT);
    let options = WatchOptions {
        once: matches.get_flag("once"),
        json: matches.get_flag("json"),
    };

    if !is_valid_key(&key) {
        eprintln!("❌ Invalid cache key: {:?}", key);
        error!(event = "cli.watch_invalid_key", key = %key);
        return Err("Invalid cache key".into());
    }

    let config = load_config_with_warning();
    let env = file_backed_environment(&config)?;
    if matches.get_flag("hidden") {
        env.visibility().set(VisibilityState::Hidden);
    }

    let mut refresh = RefreshConfig::from(&config.refresh);
    if let Some(ms) = interval_ms {
        refresh.live_interval = Duration::from_millis(ms);
    }
    if matches.get_flag("no-refresh") {
        refresh.enabled = false;
    }
    let schedule = RetrySchedule::from(&config.retry);

    info!(
        event = "cli.watch_started",
        key = %key,
        has_cached_command = cached.is_some(),
        live_interval_ms = refresh.live_interval.as_millis() as u64,
        refresh_enabled = refresh.enabled,
        visibility = %env.visibility().current(),
        once = options.once
    );

    let source = CommandSource::new(key.clone(), live, cached, env.cache()).with_timeout(timeout);
    let panel = Panel::new(key, source, &env);

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(run_watch(
        panel,
        env.visibility().clone(),
        refresh,
        schedule,
        options,
    ));

    match &result {
        Ok(()) => info!(event = "cli.watch_completed"),
        Err(e) => error!(event = "cli.watch_failed", error = %e),
    }
    result
}

async fn run_watch(
    panel: Panel<CommandSource>,
    visibility: VisibilityTracker,
    refresh: RefreshConfig,
    schedule: RetrySchedule,
    options: WatchOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_shutdown_signal(shutdown.clone()));

    let mut updates = panel.watch();
    if panel.mount() {
        let view = updates.borrow_and_update().clone();
        print_update(panel.key(), &view, options.json)?;
    }

    let orchestrator = LoadRetryOrchestrator::new(schedule);
    let settlement = tokio::select! {
        settled = panel.initial_load(&orchestrator) => settled?,
        _ = shutdown.cancelled() => {
            panel.teardown();
            return Ok(());
        }
    };

    let view = updates.borrow_and_update().clone();
    print_update(panel.key(), &view, options.json)?;
    if settlement == Settlement::Exhausted {
        info!(
            event = "cli.watch_initial_load_exhausted",
            key = panel.key(),
            has_data = view.data.is_some()
        );
    }

    if options.once {
        panel.teardown();
        return match view.data {
            Some(_) => Ok(()),
            None => Err(view.error_message().unwrap_or("no data available").into()),
        };
    }

    let handle = panel.schedule(refresh);
    let signals = tokio::spawn(forward_visibility_signals(visibility, shutdown.clone()));

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = updates.borrow_and_update().clone();
                print_update(panel.key(), &view, options.json)?;
            }
        }
    }

    handle.stop();
    panel.teardown();
    signals.abort();
    Ok(())
}

fn print_update(
    key: &str,
    view: &PanelView<Value>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string(&UpdateLine::new(key, view))?);
    } else {
        println!("{}", render_text(key, view));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct UpdateLine<'a> {
    key: &'a str,
    freshness: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    as_of: Option<DateTime<Utc>>,
    stale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    data: Option<&'a Value>,
}

impl<'a> UpdateLine<'a> {
    fn new(key: &'a str, view: &'a PanelView<Value>) -> Self {
        let (freshness, as_of) = freshness_label(&view.freshness);
        Self {
            key,
            freshness,
            as_of,
            stale: view.is_stale(),
            error: view.error_message(),
            data: view.data.as_ref(),
        }
    }
}

fn freshness_label(freshness: &Freshness) -> (&'static str, Option<DateTime<Utc>>) {
    match *freshness {
        Freshness::Empty => ("empty", None),
        Freshness::Live { fetched_at } => ("live", Some(fetched_at)),
        Freshness::Backend { fetched_at } => ("backend", Some(fetched_at)),
        Freshness::Cached { captured_at } => ("cached", Some(captured_at)),
    }
}

fn render_text(key: &str, view: &PanelView<Value>) -> String {
    let Some(data) = &view.data else {
        return match view.error_message() {
            Some(message) => format!("❌ {}: {}", key, message),
            None => format!("{}: no data yet", key),
        };
    };

    let (label, as_of) = freshness_label(&view.freshness);
    let mut out = match as_of {
        Some(at) => format!("{} [{}] {}\n", key, label, at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => format!("{} [{}]\n", key, label),
    };
    if let Some(notice) = view.stale_notice() {
        out.push_str(&format!("⚠️  {}\n", notice));
    }
    out.push_str(&serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_render_live_view() {
        let view = PanelView {
            data: Some(serde_json::json!({"rx": 100})),
            freshness: Freshness::Live { fetched_at: at() },
            error: None,
        };
        assert_eq!(
            render_text("traffic", &view),
            "traffic [live] 2024-03-01 12:00:00 UTC\n{\n  \"rx\": 100\n}"
        );
    }

    #[test]
    fn test_render_cached_view_has_notice() {
        let view = PanelView {
            data: Some(serde_json::json!(1)),
            freshness: Freshness::Cached { captured_at: at() },
            error: None,
        };
        let text = render_text("traffic", &view);
        assert!(text.starts_with("traffic [cached] 2024-03-01 12:00:00 UTC\n"));
        assert!(text.contains("Showing cached data as of 2024-03-01 12:00:00 UTC"));
    }

    #[test]
    fn test_render_error_and_empty() {
        let mut view: PanelView<Value> = PanelView::empty();
        assert_eq!(render_text("traffic", &view), "traffic: no data yet");

        view.error = Some("request timed out".to_string());
        assert_eq!(
            render_text("traffic", &view),
            "❌ traffic: request timed out"
        );
    }

    #[test]
    fn test_json_update_line() {
        let view = PanelView {
            data: Some(serde_json::json!({"rx": 100})),
            freshness: Freshness::Backend { fetched_at: at() },
            error: None,
        };
        let line = serde_json::to_value(UpdateLine::new("traffic", &view)).unwrap();
        assert_eq!(
            line,
            serde_json::json!({
                "key": "traffic",
                "freshness": "backend",
                "as_of": "2024-03-01T12:00:00Z",
                "stale": true,
                "data": {"rx": 100}
            })
        );
    }

    #[test]
    fn test_json_update_line_for_error() {
        let view: PanelView<Value> = PanelView {
            data: None,
            freshness: Freshness::Empty,
            error: Some("backend returned 503: unavailable".to_string()),
        };
        let line = serde_json::to_value(UpdateLine::new("traffic", &view)).unwrap();
        assert_eq!(line["freshness"], "empty");
        assert_eq!(line["error"], "backend returned 503: unavailable");
        assert!(line["data"].is_null());
        assert!(line.get("as_of").is_none());
    }
}
