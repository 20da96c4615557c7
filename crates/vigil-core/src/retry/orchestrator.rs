//! Initial-load state machine.
//!
//! ```text
//! NotStarted ──attempt──▶ Loading ──success──────────▶ Settled(Success)
//!                           │  ▲
//!                   failure │  │ after delays[i]
//!                           ▼  │
//!                        (retry i < max) ──i == max──▶ Settled(Exhausted)
//! ```
//!
//! Exhaustion is a normal outcome, not an error: the view stops loading and
//! falls back to whatever cached data it has.

use super::errors::LoadError;
use super::schedule::RetrySchedule;
use std::future::Future;
use std::sync::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Success,
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    NotStarted,
    /// `attempt` is 1-based.
    Loading { attempt: u32 },
    Settled(Settlement),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading { .. })
    }
}

/// What a load attempt produced, reduced to success or failure.
pub trait LoadOutcome {
    fn is_success(&self) -> bool;

    /// Short description of a failure, for logs.
    fn failure_reason(&self) -> Option<String> {
        None
    }
}

impl LoadOutcome for bool {
    fn is_success(&self) -> bool {
        *self
    }
}

impl<T> LoadOutcome for Option<T> {
    fn is_success(&self) -> bool {
        self.is_some()
    }
}

impl<E: std::fmt::Display> LoadOutcome for Result<bool, E> {
    fn is_success(&self) -> bool {
        matches!(self, Ok(true))
    }

    fn failure_reason(&self) -> Option<String> {
        self.as_ref().err().map(|e| e.to_string())
    }
}

impl<E: std::fmt::Display> LoadOutcome for Result<(), E> {
    fn is_success(&self) -> bool {
        self.is_ok()
    }

    fn failure_reason(&self) -> Option<String> {
        self.as_ref().err().map(|e| e.to_string())
    }
}

pub struct LoadRetryOrchestrator {
    schedule: RetrySchedule,
    state: watch::Sender<LoadState>,
    cancel: Mutex<CancellationToken>,
}

impl LoadRetryOrchestrator {
    pub fn new(schedule: RetrySchedule) -> Self {
        let (state, _) = watch::channel(LoadState::NotStarted);
        Self {
            schedule,
            state,
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn schedule(&self) -> &RetrySchedule {
        &self.schedule
    }

    pub fn state(&self) -> LoadState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<LoadState> {
        self.state.subscribe()
    }

    /// Whether the view should show its loading indicator.
    pub fn is_in_progress(&self) -> bool {
        self.state().is_loading()
    }

    /// Abort the running load, including any pending retry delay.
    ///
    /// The running `attempt` returns [`LoadError::Cancelled`] and the state
    /// goes back to `NotStarted`. No-op when nothing is loading.
    pub fn cancel(&self) {
        self.cancel
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .cancel();
    }

    /// Run `fetch` until it succeeds or the retry budget is spent.
    ///
    /// May be called again after settling (e.g. on remount); there is no
    /// automatic retry once exhausted.
    pub async fn attempt<F, Fut>(&self, mut fetch: F) -> Result<Settlement, LoadError>
    where
        F: FnMut() -> Fut,
        Fut: Future,
        Fut::Output: LoadOutcome,
    {
        // The fresh token is in place before Loading becomes observable, so
        // a cancel() issued after seeing Loading always reaches this load.
        let token = {
            let mut guard = self.cancel.lock().unwrap_or_else(|e| e.into_inner());
            if self.state.borrow().is_loading() {
                return Err(LoadError::AlreadyLoading);
            }
            *guard = CancellationToken::new();
            self.state.send_replace(LoadState::Loading { attempt: 1 });
            guard.clone()
        };
        let mut reset = ResetOnDrop {
            state: &self.state,
            armed: true,
        };

        info!(
            event = "core.retry.load_started",
            max_attempts = self.schedule.max_attempts()
        );

        let mut retry_index: u32 = 0;
        loop {
            let attempt = retry_index + 1;
            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(self.cancelled(&mut reset, attempt)),
                outcome = fetch() => outcome,
            };

            if outcome.is_success() {
                info!(event = "core.retry.load_completed", attempt = attempt);
                return Ok(self.settle(&mut reset, Settlement::Success));
            }

            if retry_index >= self.schedule.max_attempts() {
                warn!(
                    event = "core.retry.load_exhausted",
                    attempts = attempt,
                    reason = outcome.failure_reason().as_deref().unwrap_or("unsuccessful result"),
                    "Initial load gave up; falling back to cached data"
                );
                return Ok(self.settle(&mut reset, Settlement::Exhausted));
            }

            let delay = self.schedule.delay_for(retry_index);
            debug!(
                event = "core.retry.attempt_failed",
                attempt = attempt,
                retry_in_ms = delay.as_millis() as u64,
                reason = outcome.failure_reason().as_deref().unwrap_or("unsuccessful result")
            );

            tokio::select! {
                biased;
                _ = token.cancelled() => return Err(self.cancelled(&mut reset, attempt)),
                _ = tokio::time::sleep(delay) => {}
            }

            retry_index += 1;
            self.state.send_replace(LoadState::Loading {
                attempt: retry_index + 1,
            });
        }
    }

    fn settle(&self, reset: &mut ResetOnDrop<'_>, settlement: Settlement) -> Settlement {
        reset.armed = false;
        self.state.send_replace(LoadState::Settled(settlement));
        settlement
    }

    fn cancelled(&self, reset: &mut ResetOnDrop<'_>, attempt: u32) -> LoadError {
        reset.armed = false;
        self.state.send_replace(LoadState::NotStarted);
        info!(event = "core.retry.load_cancelled", attempt = attempt);
        LoadError::Cancelled
    }
}

impl Default for LoadRetryOrchestrator {
    fn default() -> Self {
        Self::new(RetrySchedule::default())
    }
}

impl std::fmt::Debug for LoadRetryOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadRetryOrchestrator")
            .field("schedule", &self.schedule)
            .field("state", &self.state())
            .finish()
    }
}

/// Dropping an unfinished `attempt` future leaves no stale `Loading` state.
struct ResetOnDrop<'a> {
    state: &'a watch::Sender<LoadState>,
    armed: bool,
}

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.send_replace(LoadState::NotStarted);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    fn recorder() -> (Arc<Mutex<Vec<Duration>>>, Instant) {
        (Arc::new(Mutex::new(Vec::new())), Instant::now())
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_fetch_is_tried_three_times_then_exhausts() {
        let orchestrator = LoadRetryOrchestrator::default();
        let (calls, start) = recorder();

        let result = orchestrator
            .attempt(|| {
                let calls = calls.clone();
                async move {
                    calls.lock().unwrap().push(start.elapsed());
                    Err::<bool, _>("503 Service Unavailable")
                }
            })
            .await;

        assert_eq!(result, Ok(Settlement::Exhausted));
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                Duration::ZERO,
                Duration::from_millis(2000),
                Duration::from_millis(5000)
            ]
        );
        assert_eq!(orchestrator.state(), LoadState::Settled(Settlement::Exhausted));
        assert!(!orchestrator.is_in_progress());
    }

    #[tokio::test(start_paused = true)]
    async fn test_falsy_result_counts_as_failure() {
        let orchestrator = LoadRetryOrchestrator::new(RetrySchedule::from_millis(&[10], 1));
        let count = AtomicU32::new(0);

        let result = orchestrator
            .attempt(|| {
                count.fetch_add(1, Ordering::SeqCst);
                async { false }
            })
            .await;

        assert_eq!(result, Ok(Settlement::Exhausted));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_retrying_on_first_success() {
        let orchestrator = LoadRetryOrchestrator::default();
        let count = Arc::new(AtomicU32::new(0));

        let result = orchestrator
            .attempt(|| {
                let count = count.clone();
                async move {
                    let n = count.fetch_add(1, Ordering::SeqCst);
                    if n == 0 { Err("timeout") } else { Ok(()) }
                }
            })
            .await;

        assert_eq!(result, Ok(Settlement::Success));
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(orchestrator.state(), LoadState::Settled(Settlement::Success));

        // No stray retry fires later
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_transitions_are_observable() {
        let orchestrator = Arc::new(LoadRetryOrchestrator::default());
        let mut states = orchestrator.watch_state();
        assert_eq!(*states.borrow_and_update(), LoadState::NotStarted);

        let task = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.attempt(|| async { None::<u8> }).await })
        };

        states.changed().await.unwrap();
        assert_eq!(*states.borrow_and_update(), LoadState::Loading { attempt: 1 });
        assert!(orchestrator.is_in_progress());

        states.changed().await.unwrap();
        assert_eq!(*states.borrow_and_update(), LoadState::Loading { attempt: 2 });

        assert_eq!(task.await.unwrap(), Ok(Settlement::Exhausted));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_retry() {
        let orchestrator = Arc::new(LoadRetryOrchestrator::default());
        let count = Arc::new(AtomicU32::new(0));

        let task = {
            let orchestrator = orchestrator.clone();
            let count = count.clone();
            tokio::spawn(async move {
                orchestrator
                    .attempt(|| {
                        count.fetch_add(1, Ordering::SeqCst);
                        async { false }
                    })
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        orchestrator.cancel();
        assert_eq!(task.await.unwrap(), Err(LoadError::Cancelled));
        assert_eq!(orchestrator.state(), LoadState::NotStarted);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_attempt_is_rejected() {
        let orchestrator = Arc::new(LoadRetryOrchestrator::default());
        let task = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.attempt(|| async { false }).await })
        };
        tokio::time::sleep(Duration::from_millis(1)).await;

        let second = orchestrator.attempt(|| async { true }).await;
        assert_eq!(second, Err(LoadError::AlreadyLoading));

        assert_eq!(task.await.unwrap(), Ok(Settlement::Exhausted));
    }

    #[tokio::test(start_paused = true)]
    async fn test_can_load_again_after_settling() {
        let orchestrator = LoadRetryOrchestrator::new(RetrySchedule::no_retry());
        assert_eq!(
            orchestrator.attempt(|| async { false }).await,
            Ok(Settlement::Exhausted)
        );
        assert_eq!(
            orchestrator.attempt(|| async { true }).await,
            Ok(Settlement::Success)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_attempt_resets_state() {
        let orchestrator = LoadRetryOrchestrator::default();
        {
            let attempt = orchestrator.attempt(|| async { false });
            let _ = tokio::time::timeout(Duration::from_millis(100), attempt).await;
        }
        assert_eq!(orchestrator.state(), LoadState::NotStarted);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_reaches_load_as_soon_as_loading_is_visible() {
        for _ in 0..50 {
            let orchestrator = Arc::new(LoadRetryOrchestrator::default());
            let mut state = orchestrator.watch_state();

            let task = {
                let orchestrator = orchestrator.clone();
                tokio::spawn(async move {
                    orchestrator
                        .attempt(|| std::future::pending::<bool>())
                        .await
                })
            };

            state.wait_for(|s| s.is_loading()).await.unwrap();
            orchestrator.cancel();

            let result = tokio::time::timeout(Duration::from_secs(5), task)
                .await
                .expect("cancel should end the load")
                .unwrap();
            assert_eq!(result, Err(LoadError::Cancelled));
            assert_eq!(orchestrator.state(), LoadState::NotStarted);
        }
    }
}
