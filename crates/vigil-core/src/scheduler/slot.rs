use futures::FutureExt;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::{Arc, RwLock};

/// A fetch operation as the scheduler sees it: start it, forget it.
///
/// The scheduler never looks at the outcome; consumers record success or
/// failure in their own state.
pub type FetchOp = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Wrap an async closure as a [`FetchOp`].
pub fn fetch_op<F, Fut>(f: F) -> FetchOp
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

/// Single-writer slot holding the current fetch operation.
///
/// Every invocation reads the slot, so the most recently stored operation
/// is always the one that runs (last writer wins). Replacing it does not
/// touch the timer.
#[derive(Clone)]
pub struct FetchSlot {
    op: Arc<RwLock<FetchOp>>,
}

impl FetchSlot {
    pub fn new(op: FetchOp) -> Self {
        Self {
            op: Arc::new(RwLock::new(op)),
        }
    }

    pub fn current(&self) -> FetchOp {
        self.op.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn replace(&self, op: FetchOp) {
        *self.op.write().unwrap_or_else(|e| e.into_inner()) = op;
    }
}
