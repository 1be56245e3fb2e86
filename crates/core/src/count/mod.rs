//! Exact order count pipeline: cache, start gate, and orchestrator.

mod cache;
mod config;
mod gate;
mod orchestrator;
mod types;

pub use cache::{CachedCount, CountCache};
pub use config::{
    CountConfig, MAX_AGE_CAP_MINUTES, MAX_WAIT_MS, MIN_START_INTERVAL_CAP_MS,
};
pub use gate::{StartError, StartGate};
pub use orchestrator::CountOrchestrator;
pub use types::{
    CompletedCount, CountError, CountSource, ExactCountOutcome, ExactCountRequest,
};
