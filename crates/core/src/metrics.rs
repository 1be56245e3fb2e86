//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - The exact-count pipeline (serve sources, starts, poll cycles)
//! - The Admin API client (request counts and latency)
//! - The approximate count endpoint (serve sources)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Exact-count pipeline metrics
// =============================================================================

/// Exact counts served by source.
pub static EXACT_COUNT_SERVED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "tally_exact_count_served_total",
            "Exact counts served, by source",
        ),
        &["source"], // "currentBulkOperation", "memory-cache", "poll"
    )
    .unwrap()
});

/// Bulk operation start requests by outcome.
pub static BULK_STARTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "tally_bulk_starts_total",
            "Bulk operation start requests, by outcome",
        ),
        &["outcome"], // "issued", "deduplicated", "suppressed", "failed"
    )
    .unwrap()
});

/// Completion poll cycles total.
pub static POLL_CYCLES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tally_poll_cycles_total",
        "Total bulk operation completion polls",
    )
    .unwrap()
});

// =============================================================================
// Admin API client metrics
// =============================================================================

/// Admin API requests total.
pub static ADMIN_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tally_admin_requests_total", "Total Admin API requests"),
        &["operation", "status"], // status: "ok", "timeout", "error"
    )
    .unwrap()
});

/// Admin API request duration.
pub static ADMIN_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "tally_admin_request_duration_seconds",
            "Duration of Admin API requests",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["operation"],
    )
    .unwrap()
});

// =============================================================================
// Approximate count metrics
// =============================================================================

/// Approximate order counts served by source.
pub static TOTAL_ORDERS_SERVED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "tally_total_orders_served_total",
            "Approximate order counts served, by source",
        ),
        &["source"], // "graphql", "rest_fallback"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Exact-count pipeline
        Box::new(EXACT_COUNT_SERVED.clone()),
        Box::new(BULK_STARTS.clone()),
        Box::new(POLL_CYCLES.clone()),
        // Admin API client
        Box::new(ADMIN_REQUESTS.clone()),
        Box::new(ADMIN_REQUEST_DURATION.clone()),
        // Approximate counts
        Box::new(TOTAL_ORDERS_SERVED.clone()),
    ]
}
