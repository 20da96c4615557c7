//! The scheduler's event loop. One task per scheduler; the task owns the
//! only timer, so re-arming is just dropping the old `Interval`.

use super::config::{RefreshConfig, VISIBLE_DEBOUNCE_INTERVAL};
use super::handle::Strategy;
use super::slot::FetchSlot;
use crate::visibility::VisibilityState;
use std::future::pending;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, Interval, MissedTickBehavior, Sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub(super) struct SchedulerTask {
    pub(super) name: String,
    pub(super) visibility: watch::Receiver<VisibilityState>,
    pub(super) config: watch::Receiver<RefreshConfig>,
    pub(super) live: FetchSlot,
    pub(super) cached: FetchSlot,
    pub(super) strategy: Arc<Mutex<Strategy>>,
    pub(super) shutdown: CancellationToken,
}

impl SchedulerTask {
    pub(super) async fn run(mut self) {
        let mut config = self.config.borrow_and_update().clone();
        let mut state = *self.visibility.borrow_and_update();
        let mut apply_immediate = true;
        let mut visibility_open = true;
        let mut debounce: Option<Pin<Box<Sleep>>> = None;

        loop {
            let mut ticker = self.arm(&config, state, apply_immediate);
            apply_immediate = false;

            loop {
                tokio::select! {
                    biased;

                    _ = self.shutdown.cancelled() => return,

                    changed = self.config.changed() => {
                        if changed.is_err() {
                            // Handle dropped without stop(); nothing can reach us any more
                            return;
                        }
                        config = self.config.borrow_and_update().clone();
                        apply_immediate = true;
                        debounce = None;
                        info!(
                            event = "core.scheduler.restarted",
                            scheduler = %self.name,
                            enabled = config.enabled,
                            live_interval_ms = config.live_interval.as_millis() as u64
                        );
                        break;
                    }

                    changed = self.visibility.changed(), if visibility_open => {
                        if changed.is_err() {
                            visibility_open = false;
                            continue;
                        }
                        let next = *self.visibility.borrow_and_update();
                        if next == state {
                            continue;
                        }
                        let previous = std::mem::replace(&mut state, next);
                        debounce = match (previous, next) {
                            (VisibilityState::Hidden, VisibilityState::Visible)
                                if config.resyncs_on_visible() =>
                            {
                                Some(Box::pin(tokio::time::sleep(VISIBLE_DEBOUNCE_INTERVAL)))
                            }
                            _ => None,
                        };
                        debug!(
                            event = "core.scheduler.visibility_changed",
                            scheduler = %self.name,
                            from = %previous,
                            to = %next,
                            resync = debounce.is_some()
                        );
                        break;
                    }

                    _ = next_tick(&mut ticker) => {
                        match state {
                            VisibilityState::Visible => self.invoke(&self.live, "live"),
                            VisibilityState::Hidden => self.invoke(&self.cached, "cached"),
                        }
                    }

                    _ = debounce_elapsed(&mut debounce) => {
                        debounce = None;
                        if state.is_visible() {
                            self.invoke(&self.live, "resync");
                        }
                    }
                }
            }
        }
    }

    /// Pick the strategy for `state` and build its timer. The previous
    /// timer has already been dropped by the caller.
    fn arm(
        &self,
        config: &RefreshConfig,
        state: VisibilityState,
        apply_immediate: bool,
    ) -> Option<Interval> {
        if !config.enabled {
            self.set_strategy(Strategy::Idle);
            return None;
        }

        let (interval, strategy) = match state {
            VisibilityState::Visible => (config.live_interval, Strategy::Live(config.live_interval)),
            VisibilityState::Hidden => (
                config.background_interval(),
                Strategy::Cached(config.background_interval()),
            ),
        };

        if interval.is_zero() {
            warn!(
                event = "core.scheduler.zero_interval",
                scheduler = %self.name,
                visibility = %state,
                "Refusing to arm a zero-length interval; refresh stays idle"
            );
            self.set_strategy(Strategy::Idle);
            return None;
        }

        if state.is_visible() && config.immediate && apply_immediate {
            self.invoke(&self.live, "immediate");
        }

        debug!(
            event = "core.scheduler.armed",
            scheduler = %self.name,
            strategy = ?strategy
        );
        self.set_strategy(strategy);
        Some(periodic(interval))
    }

    fn invoke(&self, slot: &FetchSlot, reason: &'static str) {
        debug!(
            event = "core.scheduler.fetch_started",
            scheduler = %self.name,
            reason = reason
        );
        // Detached: a slow fetch must not delay the next tick
        tokio::spawn(slot.current()());
    }

    fn set_strategy(&self, strategy: Strategy) {
        let mut current = self.strategy.lock().unwrap_or_else(|e| e.into_inner());
        // stop() may have won the race; Stopped is final
        if *current != Strategy::Stopped {
            *current = strategy;
        }
    }
}

/// First tick one full period from now, not immediately.
fn periodic(period: Duration) -> Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => pending().await,
    }
}

async fn debounce_elapsed(debounce: &mut Option<Pin<Box<Sleep>>>) {
    match debounce {
        Some(sleep) => sleep.as_mut().await,
        None => pending().await,
    }
}
