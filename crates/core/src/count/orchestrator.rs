//! Exact-count orchestrator: drives the bulk operation lifecycle.

use chrono::Utc;
use std::sync::Arc;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::metrics::{EXACT_COUNT_SERVED, POLL_CYCLES};
use crate::shopify::{BulkOperation, BulkStatus, OrdersApi};

use super::cache::CountCache;
use super::gate::{StartError, StartGate};
use super::types::{
    CompletedCount, CountError, CountSource, ExactCountOutcome, ExactCountRequest,
};
use super::CountConfig;

/// Resolves exact order counts against the platform's one-bulk-operation-
/// per-shop model.
///
/// Decision order per request: fresh current operation, then cache, then
/// (re)start through the gate, then either report interim state or poll
/// within the wait budget.
pub struct CountOrchestrator {
    config: CountConfig,
    api: Arc<dyn OrdersApi>,
    cache: CountCache,
    gate: StartGate,
}

impl CountOrchestrator {
    pub fn new(config: CountConfig, api: Arc<dyn OrdersApi>) -> Self {
        let gate = StartGate::new(Arc::clone(&api));
        Self {
            config,
            api,
            cache: CountCache::new(),
            gate,
        }
    }

    pub fn config(&self) -> &CountConfig {
        &self.config
    }

    pub fn cache(&self) -> &CountCache {
        &self.cache
    }

    /// Resolve one exact-count request.
    pub async fn exact_count(
        &self,
        request: &ExactCountRequest,
    ) -> Result<ExactCountOutcome, CountError> {
        let now = Utc::now();
        let mut op = self.api.current_bulk_operation().await?;

        // A completed and fresh current operation wins outright
        if let Some(current) = &op {
            if current.status == BulkStatus::Completed && !request.force {
                if let Some(age) = current.age_minutes(now) {
                    if age <= request.max_age_minutes as f64 {
                        let exact_orders = current.object_count.unwrap_or(0);
                        if let Some(completed_at) = current.created_at {
                            self.cache.put(exact_orders, completed_at).await;
                        }
                        info!(
                            exact_orders,
                            age_minutes = age,
                            "serving exact count from current bulk operation"
                        );
                        EXACT_COUNT_SERVED
                            .with_label_values(&[CountSource::CurrentOperation.as_str()])
                            .inc();
                        return Ok(ExactCountOutcome::Completed(CompletedCount {
                            exact_orders,
                            completed_at: current.created_at,
                            age_minutes: Some(age),
                            source: CountSource::CurrentOperation,
                        }));
                    }
                }
            }
        }

        // Then the cached result, judged against this request's horizon
        if !request.force {
            if let Some(hit) = self.cache.fresh(request.max_age_minutes, now).await {
                let age = hit.age_minutes(now);
                info!(
                    exact_orders = hit.exact_orders,
                    age_minutes = age,
                    "serving exact count from cache"
                );
                EXACT_COUNT_SERVED
                    .with_label_values(&[CountSource::Cache.as_str()])
                    .inc();
                return Ok(ExactCountOutcome::Completed(CompletedCount {
                    exact_orders: hit.exact_orders,
                    completed_at: Some(hit.completed_at),
                    age_minutes: Some(age),
                    source: CountSource::Cache,
                }));
            }
        }

        if needs_start(op.as_ref(), request.force) {
            match self
                .gate
                .request_start(
                    request.filter.clone(),
                    request.min_start_interval,
                    request.force,
                )
                .await
            {
                Ok(started) => {
                    debug!(id = %started.id, "bulk operation started, re-reading current state");
                    op = self.api.current_bulk_operation().await?;
                }
                Err(StartError::Suppressed) => {
                    return Ok(ExactCountOutcome::StartSuppressed {
                        status: op.map(|current| current.status),
                    });
                }
                Err(StartError::Upstream(e)) => return Err(e.into()),
            }
        }

        if !request.wait {
            let outcome = match &op {
                Some(current) => {
                    debug!(
                        status = %current.status,
                        object_count = ?current.object_count,
                        "returning interim bulk operation state"
                    );
                    ExactCountOutcome::InProgress {
                        status: current.status,
                        object_count: current.object_count,
                        completed_at: current.created_at,
                    }
                }
                None => ExactCountOutcome::InProgress {
                    status: BulkStatus::Unknown,
                    object_count: None,
                    completed_at: None,
                },
            };
            return Ok(outcome);
        }

        self.poll_for_completion(op, request).await
    }

    /// Poll the current operation until it completes, fails, or the wait
    /// budget runs out. A zero budget issues no queries at all.
    async fn poll_for_completion(
        &self,
        mut op: Option<BulkOperation>,
        request: &ExactCountRequest,
    ) -> Result<ExactCountOutcome, CountError> {
        let poll_interval = self.config.poll_interval();
        let started = Instant::now();

        while started.elapsed() < request.max_wait {
            op = self.api.current_bulk_operation().await?;
            POLL_CYCLES.inc();

            match op.as_ref() {
                Some(current) if current.status == BulkStatus::Completed => {
                    let exact_orders = current.object_count.unwrap_or(0);
                    if let Some(completed_at) = current.created_at {
                        self.cache.put(exact_orders, completed_at).await;
                    }
                    info!(
                        exact_orders,
                        waited_ms = started.elapsed().as_millis() as u64,
                        "bulk operation completed while polling"
                    );
                    EXACT_COUNT_SERVED
                        .with_label_values(&[CountSource::Poll.as_str()])
                        .inc();
                    return Ok(ExactCountOutcome::Completed(CompletedCount {
                        exact_orders,
                        completed_at: current.created_at,
                        age_minutes: None,
                        source: CountSource::Poll,
                    }));
                }
                Some(current) if current.status.is_terminal_failure() => {
                    warn!(status = %current.status, "bulk operation ended without completing");
                    return Err(CountError::JobTerminal {
                        status: current.status,
                    });
                }
                _ => {}
            }

            sleep(poll_interval).await;
        }

        debug!(
            waited_ms = started.elapsed().as_millis() as u64,
            "wait budget exhausted before completion"
        );
        Ok(ExactCountOutcome::TimedOut {
            status: op.map(|current| current.status),
        })
    }
}

/// Whether the current operation state calls for starting a fresh export.
/// A completed operation is only restarted under `force`; RUNNING and
/// UNKNOWN states are left to finish.
fn needs_start(op: Option<&BulkOperation>, force: bool) -> bool {
    match op {
        None => true,
        Some(current) => match current.status {
            BulkStatus::Canceled
            | BulkStatus::Failed
            | BulkStatus::Expired
            | BulkStatus::Idle => true,
            BulkStatus::Completed => force,
            BulkStatus::Running | BulkStatus::Unknown => false,
        },
    }
}
