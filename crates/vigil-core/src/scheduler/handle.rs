use super::config::RefreshConfig;
use super::slot::{FetchOp, FetchSlot};
use super::task::SchedulerTask;
use crate::visibility::VisibilityTracker;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// The one timer a scheduler currently has armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Disabled or misconfigured: no timer armed.
    Idle,
    /// Live fetch every interval.
    Live(Duration),
    /// Cached fetch every interval.
    Cached(Duration),
    /// `stop()` was called.
    Stopped,
}

pub struct RefreshScheduler;

impl RefreshScheduler {
    /// Start refreshing with `live` and `cached` under `config`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        name: impl Into<String>,
        visibility: &VisibilityTracker,
        config: RefreshConfig,
        live: FetchOp,
        cached: FetchOp,
    ) -> RefreshHandle {
        let name = name.into();
        let (config_tx, config_rx) = watch::channel(config.clone());
        let live = FetchSlot::new(live);
        let cached = FetchSlot::new(cached);
        let strategy = Arc::new(Mutex::new(Strategy::Idle));
        let shutdown = CancellationToken::new();

        info!(
            event = "core.scheduler.started",
            scheduler = %name,
            enabled = config.enabled,
            visibility = %visibility.current(),
            live_interval_ms = config.live_interval.as_millis() as u64
        );

        let task = SchedulerTask {
            name: name.clone(),
            visibility: visibility.watch(),
            config: config_rx,
            live: live.clone(),
            cached: cached.clone(),
            strategy: strategy.clone(),
            shutdown: shutdown.clone(),
        };
        let join = tokio::spawn(task.run());

        RefreshHandle {
            name,
            config: config_tx,
            live,
            cached,
            strategy,
            shutdown,
            join,
        }
    }
}

/// Owner of a running scheduler. Dropping it stops the scheduler.
pub struct RefreshHandle {
    name: String,
    config: watch::Sender<RefreshConfig>,
    live: FetchSlot,
    cached: FetchSlot,
    strategy: Arc<Mutex<Strategy>>,
    shutdown: CancellationToken,
    join: JoinHandle<()>,
}

impl RefreshHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> RefreshConfig {
        self.config.borrow().clone()
    }

    pub fn strategy(&self) -> Strategy {
        *self.strategy.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Re-arm under a new config. The old timer is released first and
    /// `immediate` applies again. Returns `false` once stopped.
    pub fn restart(&self, config: RefreshConfig) -> bool {
        if self.is_stopped() {
            return false;
        }
        self.config.send_replace(config);
        true
    }

    pub fn set_live_fetch(&self, op: FetchOp) {
        self.live.replace(op);
    }

    pub fn set_cached_fetch(&self, op: FetchOp) {
        self.cached.replace(op);
    }

    /// Release the timer and any pending re-sync. Fetches already in flight
    /// run to completion. Idempotent.
    pub fn stop(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        self.shutdown.cancel();
        self.join.abort();
        *self.strategy.lock().unwrap_or_else(|e| e.into_inner()) = Strategy::Stopped;
        info!(event = "core.scheduler.stopped", scheduler = %self.name);
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for RefreshHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshHandle")
            .field("name", &self.name)
            .field("strategy", &self.strategy())
            .finish_non_exhaustive()
    }
}
