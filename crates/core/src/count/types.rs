//! Types for the exact-count pipeline.

use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

use crate::shopify::{AdminApiError, BulkStatus};

use super::CountConfig;

/// A single exact-count request with its effective (already clamped) knobs.
#[derive(Debug, Clone)]
pub struct ExactCountRequest {
    /// Optional order search filter for a fresh export.
    pub filter: Option<String>,
    /// Whether to block polling for completion.
    pub wait: bool,
    /// Wait budget when polling.
    pub max_wait: Duration,
    /// Discard fresh results and suppression, force a new export.
    pub force: bool,
    /// How old a completed result may be and still count as fresh.
    pub max_age_minutes: u32,
    /// Minimum spacing between bulk operation starts.
    pub min_start_interval: Duration,
}

impl ExactCountRequest {
    /// A request with no filter and every knob at its configured default.
    pub fn with_defaults(config: &CountConfig) -> Self {
        Self {
            filter: None,
            wait: false,
            max_wait: config.clamp_wait_timeout(None),
            force: false,
            max_age_minutes: config.clamp_max_age_minutes(None),
            min_start_interval: config.clamp_min_start_interval(None),
        }
    }
}

/// Where a completed count came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountSource {
    /// The platform's current bulk operation was already completed and fresh.
    CurrentOperation,
    /// Served from the in-process cache of the last completed result.
    Cache,
    /// Completed while this request polled.
    Poll,
}

impl CountSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CountSource::CurrentOperation => "currentBulkOperation",
            CountSource::Cache => "memory-cache",
            CountSource::Poll => "poll",
        }
    }
}

/// A completed exact count.
#[derive(Debug, Clone)]
pub struct CompletedCount {
    pub exact_orders: u64,
    pub completed_at: Option<DateTime<Utc>>,
    /// Age of the result. Absent when completion was observed just now.
    pub age_minutes: Option<f64>,
    pub source: CountSource,
}

/// Outcome of an exact-count request that did not fail outright.
#[derive(Debug, Clone)]
pub enum ExactCountOutcome {
    /// An exact count is available.
    Completed(CompletedCount),
    /// An export is underway (or in an indeterminate state); the caller
    /// chose not to wait it out.
    InProgress {
        status: BulkStatus,
        object_count: Option<u64>,
        completed_at: Option<DateTime<Utc>>,
    },
    /// A start was needed but suppressed by the rate-limit interval.
    StartSuppressed { status: Option<BulkStatus> },
    /// The wait budget ran out before the export completed.
    TimedOut { status: Option<BulkStatus> },
}

/// Errors from the exact-count pipeline.
#[derive(Debug, Error)]
pub enum CountError {
    #[error(transparent)]
    Admin(#[from] AdminApiError),

    #[error("Bulk operation ended {status}")]
    JobTerminal { status: BulkStatus },
}
