//! Start gate: de-duplicates and rate-limits bulk operation starts.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::metrics::BULK_STARTS;
use crate::shopify::{AdminApiError, BulkOperation, OrdersApi};

type SharedStart = Shared<BoxFuture<'static, Result<BulkOperation, AdminApiError>>>;

/// Errors from requesting a bulk operation start.
#[derive(Debug, Error)]
pub enum StartError {
    /// A start happened too recently; no upstream call was made.
    #[error("Bulk operation start suppressed")]
    Suppressed,

    #[error(transparent)]
    Upstream(AdminApiError),
}

#[derive(Default)]
struct GateState {
    /// When the last start *succeeded*. Failed attempts leave this untouched
    /// so the next request may retry immediately.
    last_start: Option<Instant>,
    /// Start currently in flight, shared by every request that joins it.
    in_flight: Option<SharedStart>,
}

/// Serializes bulk operation starts across concurrent requests.
///
/// Suppression is checked before the in-flight slot: within the interval a
/// non-forced request is turned away even while another start is running.
pub struct StartGate {
    api: Arc<dyn OrdersApi>,
    state: Arc<Mutex<GateState>>,
}

impl StartGate {
    pub fn new(api: Arc<dyn OrdersApi>) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(GateState::default())),
        }
    }

    /// Start a bulk order export, joining an in-flight start when one exists.
    pub async fn request_start(
        &self,
        filter: Option<String>,
        min_start_interval: Duration,
        force: bool,
    ) -> Result<BulkOperation, StartError> {
        let shared = {
            let mut state = self.state.lock().await;

            if !force {
                if let Some(last) = state.last_start {
                    if last.elapsed() < min_start_interval {
                        info!(
                            since_last_ms = last.elapsed().as_millis() as u64,
                            min_interval_ms = min_start_interval.as_millis() as u64,
                            "bulk operation start suppressed"
                        );
                        BULK_STARTS.with_label_values(&["suppressed"]).inc();
                        return Err(StartError::Suppressed);
                    }
                }
            }

            if let Some(pending) = &state.in_flight {
                debug!("joining in-flight bulk operation start");
                BULK_STARTS.with_label_values(&["deduplicated"]).inc();
                pending.clone()
            } else {
                let api = Arc::clone(&self.api);
                let gate = Arc::clone(&self.state);
                let shared: SharedStart = async move {
                    let result = api.start_order_export(filter.as_deref()).await;

                    let mut state = gate.lock().await;
                    state.in_flight = None;
                    match &result {
                        Ok(op) => {
                            state.last_start = Some(Instant::now());
                            info!(id = %op.id, status = %op.status, "bulk operation started");
                        }
                        Err(e) => {
                            warn!(error = %e, "bulk operation start failed");
                            BULK_STARTS.with_label_values(&["failed"]).inc();
                        }
                    }
                    result
                }
                .boxed()
                .shared();

                // The start must run to completion even if every requester
                // disconnects before it resolves.
                tokio::spawn(shared.clone().map(|_| ()));

                BULK_STARTS.with_label_values(&["issued"]).inc();
                state.in_flight = Some(shared.clone());
                shared
            }
        };

        shared.await.map_err(StartError::Upstream)
    }
}
