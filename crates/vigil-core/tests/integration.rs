//! End-to-end tests for a panel driven by the scheduler and the retry
//! orchestrator over a file-backed cache.
//!
//! Tokio time is paused, so every interval and retry delay is deterministic.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vigil_core::{
    DataSource, Environment, FetchError, FileStore, Freshness, LoadRetryOrchestrator, Panel,
    RefreshConfig, RetrySchedule, Settlement, SystemClock, VisibilityState, VisibilityTracker,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Traffic {
    visits: u32,
}

/// A backend that can be taken down and brought back, counting every call.
/// Clones share the same state.
#[derive(Clone, Default)]
struct FlakyBackend {
    down: Arc<AtomicBool>,
    live_calls: Arc<AtomicU32>,
    cached_calls: Arc<AtomicU32>,
}

impl FlakyBackend {
    fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }
}

impl DataSource for FlakyBackend {
    type Payload = Traffic;

    async fn fetch_live(&self) -> Result<Traffic, FetchError> {
        let call = self.live_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.down.load(Ordering::SeqCst) {
            return Err(FetchError::Timeout);
        }
        Ok(Traffic { visits: 100 + call })
    }

    async fn fetch_cached(&self) -> Result<Traffic, FetchError> {
        self.cached_calls.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(FetchError::Timeout);
        }
        Ok(Traffic { visits: 1 })
    }
}

fn file_env(dir: &std::path::Path) -> Environment {
    Environment::new(
        VisibilityTracker::new(VisibilityState::Visible),
        Arc::new(FileStore::new(dir)),
        Arc::new(SystemClock),
    )
}

#[tokio::test(start_paused = true)]
async fn test_outage_on_first_load_then_recovery() {
    let dir = tempfile::tempdir().unwrap();
    let env = file_env(dir.path());

    // A previous session left data behind.
    assert!(env.cache().write("traffic", &Traffic { visits: 42 }));

    let backend = FlakyBackend::default();
    backend.set_down(true);
    let panel = Panel::new("traffic", backend.clone(), &env);
    assert!(panel.mount());

    let orchestrator = LoadRetryOrchestrator::new(RetrySchedule::default());
    let settlement = panel.initial_load(&orchestrator).await.unwrap();
    assert_eq!(settlement, Settlement::Exhausted);
    assert_eq!(backend.live_calls.load(Ordering::SeqCst), 3);

    let view = panel.view();
    assert_eq!(view.data, Some(Traffic { visits: 42 }));
    assert!(view.stale_notice().is_some());
    assert!(view.error_message().is_none());

    // Periodic refresh picks the backend up once it is back.
    backend.set_down(false);
    let handle =
        panel.schedule(RefreshConfig::new(Duration::from_millis(5000)).with_immediate(false));
    tokio::time::sleep(Duration::from_millis(5100)).await;

    let view = panel.view();
    assert_eq!(view.data, Some(Traffic { visits: 104 }));
    assert!(matches!(view.freshness, Freshness::Live { .. }));
    assert!(view.stale_notice().is_none());

    // The fresh payload replaced the old one on disk.
    let reopened = file_env(dir.path());
    let entry = reopened.cache().read::<Traffic>("traffic").unwrap();
    assert_eq!(entry.payload, Traffic { visits: 104 });

    handle.stop();
}

#[tokio::test(start_paused = true)]
async fn test_hidden_page_polls_cached_and_resyncs_on_return() {
    let dir = tempfile::tempdir().unwrap();
    let env = file_env(dir.path());
    let backend = FlakyBackend::default();
    let panel = Panel::new("traffic", backend.clone(), &env);

    let handle = panel.schedule(RefreshConfig::new(Duration::from_millis(5000)));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(backend.live_calls.load(Ordering::SeqCst), 1);

    env.visibility().set(VisibilityState::Hidden);
    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(backend.live_calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.cached_calls.load(Ordering::SeqCst), 1);

    // Backend snapshot is shown but never persisted locally.
    let view = panel.view();
    assert_eq!(view.data, Some(Traffic { visits: 1 }));
    assert!(matches!(view.freshness, Freshness::Backend { .. }));
    let entry = env.cache().read::<Traffic>("traffic").unwrap();
    assert_eq!(entry.payload, Traffic { visits: 101 });

    env.visibility().set(VisibilityState::Visible);
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(backend.live_calls.load(Ordering::SeqCst), 2);
    assert!(matches!(panel.view().freshness, Freshness::Live { .. }));

    handle.stop();
    panel.teardown();
}

#[tokio::test(start_paused = true)]
async fn test_panels_share_one_store_under_distinct_keys() {
    let dir = tempfile::tempdir().unwrap();
    let env = file_env(dir.path());

    let traffic = Panel::new("traffic", FlakyBackend::default(), &env);
    let signups = Panel::new("signups/daily", FlakyBackend::default(), &env);

    assert!(traffic.refresh_live().await);
    assert!(signups.refresh_live().await);
    assert!(signups.refresh_live().await);

    let cache = env.cache();
    assert_eq!(
        cache.read::<Traffic>("traffic").unwrap().payload,
        Traffic { visits: 101 }
    );
    assert_eq!(
        cache.read::<Traffic>("signups/daily").unwrap().payload,
        Traffic { visits: 102 }
    );
}
