//! Bounded retry for a view's very first data load.

mod errors;
mod orchestrator;
mod schedule;

pub use errors::LoadError;
pub use orchestrator::{LoadOutcome, LoadRetryOrchestrator, LoadState, Settlement};
pub use schedule::RetrySchedule;
