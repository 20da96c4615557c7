use super::source::{DataSource, FetchError};
use super::view::{Freshness, PanelView};
use crate::cache::LocalCacheStore;
use crate::environment::{Clock, Environment};
use crate::retry::{LoadError, LoadRetryOrchestrator, Settlement};
use crate::scheduler::{RefreshConfig, RefreshHandle, RefreshScheduler, fetch_op};
use crate::visibility::VisibilityTracker;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchKind {
    Live,
    Cached,
}

impl FetchKind {
    fn as_str(self) -> &'static str {
        match self {
            FetchKind::Live => "live",
            FetchKind::Cached => "cached",
        }
    }
}

struct PanelInner<S: DataSource> {
    key: String,
    source: S,
    cache: LocalCacheStore,
    clock: Arc<dyn Clock>,
    visibility: VisibilityTracker,
    view: watch::Sender<PanelView<S::Payload>>,
    mounted: AtomicBool,
    issued: AtomicU64,
    /// Generation of the last committed response. Held while mutating the
    /// view so the generation check and the commit are one step.
    committed: Mutex<u64>,
}

/// One data source rendered under one cache key.
///
/// Cloning is cheap and every clone shares the same display state.
pub struct Panel<S: DataSource> {
    inner: Arc<PanelInner<S>>,
}

impl<S: DataSource> Clone for Panel<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: DataSource> Panel<S> {
    pub fn new(key: impl Into<String>, source: S, env: &Environment) -> Self {
        let (view, _) = watch::channel(PanelView::empty());
        Self {
            inner: Arc::new(PanelInner {
                key: key.into(),
                source,
                cache: env.cache(),
                clock: env.clock().clone(),
                visibility: env.visibility().clone(),
                view,
                mounted: AtomicBool::new(true),
                issued: AtomicU64::new(0),
                committed: Mutex::new(0),
            }),
        }
    }

    pub fn key(&self) -> &str {
        &self.inner.key
    }

    pub fn source(&self) -> &S {
        &self.inner.source
    }

    pub fn view(&self) -> PanelView<S::Payload> {
        self.inner.view.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<PanelView<S::Payload>> {
        self.inner.view.subscribe()
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.load(Ordering::SeqCst)
    }

    /// Show the locally cached payload, if any, before the first fetch lands.
    ///
    /// Returns whether the panel has data to show afterwards.
    pub fn mount(&self) -> bool {
        let _commit = self.lock_commit();
        if !self.is_mounted() {
            return false;
        }
        if self.inner.view.borrow().data.is_some() {
            return true;
        }

        match self.inner.cache.read::<S::Payload>(&self.inner.key) {
            Some(entry) => {
                info!(
                    event = "core.panel.mounted",
                    panel = %self.inner.key,
                    from_cache = true,
                    captured_at = %entry.captured_at
                );
                self.inner.view.send_replace(PanelView {
                    data: Some(entry.payload),
                    freshness: Freshness::Cached {
                        captured_at: entry.captured_at,
                    },
                    error: None,
                });
                true
            }
            None => {
                info!(
                    event = "core.panel.mounted",
                    panel = %self.inner.key,
                    from_cache = false
                );
                false
            }
        }
    }

    /// Fetch from the live backend and persist the result locally.
    ///
    /// A failure keeps the current display, falling back to the local cache
    /// only when nothing is shown yet.
    pub async fn refresh_live(&self) -> bool {
        self.refresh(FetchKind::Live).await.unwrap_or(false)
    }

    /// Fetch the backend-held snapshot. Never written to the local cache.
    pub async fn refresh_cached(&self) -> bool {
        self.refresh(FetchKind::Cached).await.unwrap_or(false)
    }

    /// First load, retried per the orchestrator's schedule.
    ///
    /// Failed attempts only fall back to the local cache. The error is
    /// recorded once the budget is exhausted, and only if there is still
    /// nothing to show.
    pub async fn initial_load(
        &self,
        orchestrator: &LoadRetryOrchestrator,
    ) -> Result<Settlement, LoadError> {
        let last_error: Mutex<Option<FetchError>> = Mutex::new(None);

        let settlement = orchestrator
            .attempt(|| {
                let last_error = &last_error;
                async move {
                    match self.refresh(FetchKind::Live).await {
                        Ok(shown) => shown,
                        Err(err) => {
                            *last_error.lock().unwrap_or_else(|e| e.into_inner()) = Some(err);
                            false
                        }
                    }
                }
            })
            .await?;

        if settlement == Settlement::Exhausted {
            let last_error = last_error.into_inner().unwrap_or_else(|e| e.into_inner());
            if let Some(err) = last_error {
                self.record_error(&err);
            }
        }
        Ok(settlement)
    }

    /// Drive this panel from a [`RefreshScheduler`] bound to its visibility.
    ///
    /// Dropping the returned handle stops the timers.
    pub fn schedule(&self, config: RefreshConfig) -> RefreshHandle {
        let live = {
            let panel = self.clone();
            fetch_op(move || {
                let panel = panel.clone();
                async move {
                    panel.refresh_live().await;
                }
            })
        };
        let cached = {
            let panel = self.clone();
            fetch_op(move || {
                let panel = panel.clone();
                async move {
                    panel.refresh_cached().await;
                }
            })
        };

        RefreshScheduler::start(
            self.inner.key.clone(),
            &self.inner.visibility,
            config,
            live,
            cached,
        )
    }

    /// Mark the panel irrelevant. In-flight results are discarded unseen.
    pub fn teardown(&self) {
        if self.inner.mounted.swap(false, Ordering::SeqCst) {
            info!(event = "core.panel.torn_down", panel = %self.inner.key);
        }
    }

    /// `Ok(true)` when the panel shows the fetched data (or newer),
    /// `Ok(false)` when the result was discarded after teardown.
    async fn refresh(&self, kind: FetchKind) -> Result<bool, FetchError> {
        if !self.is_mounted() {
            return Ok(false);
        }
        let generation = self.inner.issued.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(
            event = "core.panel.fetch_started",
            panel = %self.inner.key,
            fetch = kind.as_str(),
            generation = generation
        );

        let result = match kind {
            FetchKind::Live => self.inner.source.fetch_live().await,
            FetchKind::Cached => self.inner.source.fetch_cached().await,
        };

        match result {
            Ok(payload) => Ok(self.commit(kind, generation, payload)),
            Err(err) => {
                self.fall_back(kind, &err);
                Err(err)
            }
        }
    }

    fn commit(&self, kind: FetchKind, generation: u64, payload: S::Payload) -> bool {
        let mut committed = self.lock_commit();
        if !self.is_mounted() {
            debug!(
                event = "core.panel.result_discarded",
                panel = %self.inner.key,
                reason = "torn_down"
            );
            return false;
        }
        if generation <= *committed {
            // A newer response is already on screen.
            debug!(
                event = "core.panel.result_discarded",
                panel = %self.inner.key,
                reason = "superseded",
                generation = generation,
                committed = *committed
            );
            return true;
        }
        *committed = generation;

        let now = self.inner.clock.now();
        let freshness = match kind {
            FetchKind::Live => {
                self.inner.cache.write(&self.inner.key, &payload);
                Freshness::Live { fetched_at: now }
            }
            FetchKind::Cached => Freshness::Backend { fetched_at: now },
        };
        self.inner.view.send_replace(PanelView {
            data: Some(payload),
            freshness,
            error: None,
        });

        debug!(
            event = "core.panel.fetch_completed",
            panel = %self.inner.key,
            fetch = kind.as_str(),
            generation = generation
        );
        true
    }

    fn fall_back(&self, kind: FetchKind, err: &FetchError) {
        let _commit = self.lock_commit();
        if !self.is_mounted() {
            return;
        }
        warn!(
            event = "core.panel.fetch_failed",
            panel = %self.inner.key,
            fetch = kind.as_str(),
            error = %err
        );

        if self.inner.view.borrow().data.is_some() {
            return;
        }

        match self.inner.cache.read::<S::Payload>(&self.inner.key) {
            Some(entry) => {
                info!(
                    event = "core.panel.showing_cached",
                    panel = %self.inner.key,
                    captured_at = %entry.captured_at
                );
                self.inner.view.send_replace(PanelView {
                    data: Some(entry.payload),
                    freshness: Freshness::Cached {
                        captured_at: entry.captured_at,
                    },
                    error: None,
                });
            }
            None => {
                debug!(
                    event = "core.panel.no_fallback",
                    panel = %self.inner.key
                );
            }
        }
    }

    /// Surface `err` when there is nothing at all to show.
    fn record_error(&self, err: &FetchError) {
        let _commit = self.lock_commit();
        if !self.is_mounted() {
            return;
        }
        self.inner.view.send_if_modified(|view| {
            if view.data.is_some() {
                return false;
            }
            view.error = Some(err.to_string());
            true
        });
    }

    fn lock_commit(&self) -> std::sync::MutexGuard<'_, u64> {
        self.inner
            .committed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }
}

impl<S: DataSource> std::fmt::Debug for Panel<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Panel")
            .field("key", &self.inner.key)
            .field("mounted", &self.is_mounted())
            .finish_non_exhaustive()
    }
}
