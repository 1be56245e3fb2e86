//! Order-count API handlers.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use tally_core::{
    metrics::TOTAL_ORDERS_SERVED, AdminApiError, BulkStatus, CountConfig, CountError,
    CountPrecision, CountSource, ExactCountOutcome, ExactCountRequest,
};

use crate::state::AppState;

const MISSING_CREDENTIALS: &str = "Missing SHOPIFY_DOMAIN or SHOPIFY_ADMIN_API_ACCESS_TOKEN";

/// CDN cache hint protecting the exact-count endpoint against stampedes.
const CACHE_CONTROL_VALUE: &str = "s-maxage=5, stale-while-revalidate=30";

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TotalOrdersParams {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactCountParams {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub wait: Option<String>,
    #[serde(default)]
    pub timeout_ms: Option<String>,
    #[serde(default)]
    pub force: Option<String>,
    #[serde(default)]
    pub max_age_minutes: Option<String>,
    #[serde(default)]
    pub min_start_interval_ms: Option<String>,
}

impl ExactCountParams {
    /// Build the pipeline request, clamping every knob to its hard cap.
    fn to_request(&self, config: &CountConfig) -> ExactCountRequest {
        ExactCountRequest {
            filter: self.query.clone().filter(|q| !q.is_empty()),
            wait: flag(&self.wait),
            max_wait: config.clamp_wait_timeout(number(&self.timeout_ms)),
            force: flag(&self.force),
            max_age_minutes: config.clamp_max_age_minutes(number(&self.max_age_minutes)),
            min_start_interval: config
                .clamp_min_start_interval(number(&self.min_start_interval_ms)),
        }
    }
}

/// Boolean query flags match the original API: only "1" enables.
fn flag(value: &Option<String>) -> bool {
    value.as_deref() == Some("1")
}

fn number(value: &Option<String>) -> Option<i64> {
    value.as_deref().and_then(|v| v.trim().parse().ok())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalOrdersResponse {
    pub total_orders: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<CountPrecision>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactCountResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact_orders: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_minutes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /total-orders
///
/// Approximate live order count via the `ordersCount` GraphQL query, with
/// the deprecated REST count endpoint as a last-resort fallback.
pub async fn total_orders(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TotalOrdersParams>,
) -> Response {
    let Some(orders) = state.orders() else {
        return missing_credentials();
    };

    let filter = params.query.as_deref().filter(|q| !q.is_empty());
    match orders.orders_count(filter).await {
        Ok(count) => {
            TOTAL_ORDERS_SERVED.with_label_values(&["graphql"]).inc();
            (
                StatusCode::OK,
                Json(TotalOrdersResponse {
                    total_orders: count.count,
                    precision: count.precision,
                }),
            )
                .into_response()
        }
        Err(e) => {
            warn!(error = %e, "ordersCount failed, trying REST fallback");
            match orders.orders_count_rest().await {
                Ok(count) => {
                    TOTAL_ORDERS_SERVED
                        .with_label_values(&["rest_fallback"])
                        .inc();
                    (
                        StatusCode::OK,
                        Json(TotalOrdersResponse {
                            total_orders: count,
                            precision: None,
                        }),
                    )
                        .into_response()
                }
                Err(rest_err) => {
                    error!(error = %rest_err, "REST fallback failed as well");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(ErrorResponse {
                            status: None,
                            error: "Failed to fetch order count".to_string(),
                            detail: None,
                        }),
                    )
                        .into_response()
                }
            }
        }
    }
}

/// GET /exact-order-count
///
/// Exact order count via the bulk operation lifecycle. The orchestrator
/// decides between current operation, cache, (re)start and polling; this
/// handler maps its outcomes onto statuses, bodies and diagnostic headers.
pub async fn exact_order_count(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExactCountParams>,
) -> Response {
    let mut response = match state.orchestrator() {
        Some(orchestrator) => {
            let request = params.to_request(orchestrator.config());
            match orchestrator.exact_count(&request).await {
                Ok(outcome) => outcome_response(outcome),
                Err(e) => error_response(e),
            }
        }
        None => missing_credentials(),
    };
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(CACHE_CONTROL_VALUE),
    );
    response
}

// ============================================================================
// Outcome mapping
// ============================================================================

fn outcome_response(outcome: ExactCountOutcome) -> Response {
    match outcome {
        ExactCountOutcome::Completed(done) => {
            let mut headers = HeaderMap::new();
            insert_header(&mut headers, "x-exact-status", "COMPLETED");
            insert_header(&mut headers, "x-exact-orders", &done.exact_orders.to_string());
            insert_header(&mut headers, "x-exact-source", done.source.as_str());
            if let Some(completed_at) = done.completed_at {
                insert_header(&mut headers, "x-exact-completed-at", &rfc3339(completed_at));
            }
            insert_header(
                &mut headers,
                "server-timing",
                &format!("exact;desc=\"{}\"", done.exact_orders),
            );
            (
                StatusCode::OK,
                headers,
                Json(ExactCountResponse {
                    status: BulkStatus::Completed.as_str().to_string(),
                    exact_orders: Some(done.exact_orders),
                    object_count: None,
                    completed_at: done.completed_at,
                    age_minutes: done.age_minutes,
                    message: None,
                }),
            )
                .into_response()
        }
        ExactCountOutcome::InProgress {
            status,
            object_count,
            completed_at,
        } => {
            let mut headers = HeaderMap::new();
            // Diagnostic headers only once an object count is known
            if let Some(count) = object_count {
                insert_header(&mut headers, "x-exact-orders", &count.to_string());
                insert_header(&mut headers, "x-exact-status", status.as_str());
                insert_header(
                    &mut headers,
                    "x-exact-source",
                    CountSource::CurrentOperation.as_str(),
                );
                if status == BulkStatus::Completed {
                    if let Some(completed_at) = completed_at {
                        insert_header(
                            &mut headers,
                            "x-exact-completed-at",
                            &rfc3339(completed_at),
                        );
                    }
                }
            }
            (
                StatusCode::OK,
                headers,
                Json(ExactCountResponse {
                    status: status.as_str().to_string(),
                    exact_orders: None,
                    object_count,
                    completed_at,
                    age_minutes: None,
                    message: None,
                }),
            )
                .into_response()
        }
        ExactCountOutcome::StartSuppressed { status } => pending_response(
            status,
            "Start suppressed to protect rate limits; try again shortly.",
        ),
        ExactCountOutcome::TimedOut { status } => pending_response(
            status,
            "Still running, poll again or pass wait=1&timeoutMs=30000",
        ),
    }
}

/// 202 body shared by the suppressed and budget-exhausted outcomes.
fn pending_response(status: Option<BulkStatus>, message: &str) -> Response {
    let status_label = status
        .map(|s| s.as_str().to_string())
        .unwrap_or_else(|| "PENDING".to_string());
    (
        StatusCode::ACCEPTED,
        Json(ExactCountResponse {
            status: status_label,
            exact_orders: None,
            object_count: None,
            completed_at: None,
            age_minutes: None,
            message: Some(message.to_string()),
        }),
    )
        .into_response()
}

fn error_response(err: CountError) -> Response {
    match err {
        CountError::Admin(AdminApiError::StartRejected(detail)) => {
            warn!(detail = %detail, "bulk operation start rejected upstream");
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    status: None,
                    error: "Failed to run exact order count".to_string(),
                    detail: Some(detail),
                }),
            )
                .into_response()
        }
        CountError::JobTerminal { status } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                status: Some(status.as_str().to_string()),
                error: "Bulk operation did not complete successfully".to_string(),
                detail: None,
            }),
        )
            .into_response(),
        CountError::Admin(e) => {
            error!(error = %e, "exact order count failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    status: None,
                    error: "Failed to run exact order count".to_string(),
                    detail: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}

fn missing_credentials() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            status: None,
            error: MISSING_CREDENTIALS.to_string(),
            detail: None,
        }),
    )
        .into_response()
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
