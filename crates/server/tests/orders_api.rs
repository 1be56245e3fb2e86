//! End-to-end tests for the order-count API.
//!
//! These tests run the full router in-process with a mock Admin API,
//! asserting status codes, bodies and the diagnostic headers.

mod common;

use axum::http::StatusCode;
use std::time::Duration;
use tally_core::{AdminApiError, BulkStatus, CountPrecision};

use common::{fixtures, TestFixture};

// =============================================================================
// Health / config / metrics
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new();
    let response = fixture.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_endpoint_hides_access_token() {
    let fixture = TestFixture::new();
    let response = fixture.get("/config").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["shopify"]["domain"], "test-shop.myshopify.com");
    assert_eq!(response.body["shopify"]["access_token_configured"], true);
    // The token itself never leaves the process
    assert!(!response.body.to_string().contains("shpat_test_token"));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new();
    let (status, body) = fixture.get_raw("/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("tally_http_requests_total"));
}

// =============================================================================
// GET /total-orders
// =============================================================================

#[tokio::test]
async fn test_total_orders_via_graphql() {
    let fixture = TestFixture::new();
    fixture
        .orders
        .set_orders_count(1042, Some(CountPrecision::Exact))
        .await;

    let response = fixture.get("/total-orders").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["totalOrders"], 1042);
    assert_eq!(response.body["precision"], "EXACT");
    assert_eq!(fixture.orders.orders_count_calls().await, vec![None]);
    assert_eq!(fixture.orders.rest_call_count().await, 0);
}

#[tokio::test]
async fn test_total_orders_forwards_filter() {
    let fixture = TestFixture::new();

    let response = fixture
        .get("/total-orders?query=financial_status%3Apaid")
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(
        fixture.orders.orders_count_calls().await,
        vec![Some("financial_status:paid".to_string())]
    );
}

#[tokio::test]
async fn test_total_orders_rest_fallback() {
    let fixture = TestFixture::new();
    fixture
        .orders
        .set_next_error(AdminApiError::ApiError("GraphQL down".to_string()))
        .await;
    fixture.orders.set_rest_count(998).await;

    let response = fixture.get("/total-orders").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["totalOrders"], 998);
    // The REST count carries no precision qualifier
    assert!(response.body.get("precision").is_none());
    assert_eq!(fixture.orders.rest_call_count().await, 1);
}

#[tokio::test]
async fn test_total_orders_both_paths_fail() {
    let fixture = TestFixture::new();
    fixture
        .orders
        .set_next_error(AdminApiError::ApiError("GraphQL down".to_string()))
        .await;
    fixture
        .orders
        .set_next_error(AdminApiError::ConnectionFailed("REST down".to_string()))
        .await;

    let response = fixture.get("/total-orders").await;

    assert_status!(response, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["error"], "Failed to fetch order count");
}

// =============================================================================
// GET /exact-order-count
// =============================================================================

#[tokio::test]
async fn test_exact_count_completed_with_headers() {
    let fixture = TestFixture::new();
    fixture
        .orders
        .set_current_operation(Some(fixtures::completed_operation(42, 10)))
        .await;

    let response = fixture.get("/exact-order-count").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "COMPLETED");
    assert_eq!(response.body["exactOrders"], 42);
    assert!(response.body["completedAt"].is_string());
    let age = response.body["ageMinutes"].as_f64().unwrap();
    assert!((age - 10.0).abs() < 0.1, "age was {age}");

    assert_eq!(response.header("x-exact-status"), Some("COMPLETED"));
    assert_eq!(response.header("x-exact-orders"), Some("42"));
    assert_eq!(response.header("x-exact-source"), Some("currentBulkOperation"));
    assert!(response.header("x-exact-completed-at").is_some());
    assert_eq!(response.header("server-timing"), Some("exact;desc=\"42\""));
    assert_eq!(
        response.header("cache-control"),
        Some("s-maxage=5, stale-while-revalidate=30")
    );
}

#[tokio::test]
async fn test_exact_count_interim_running() {
    let fixture = TestFixture::new();

    // No current operation: the request starts one and reports its state
    let response = fixture.get("/exact-order-count").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "RUNNING");
    assert!(response.body.get("exactOrders").is_none());
    assert!(response.body.get("message").is_none());
    assert_eq!(fixture.orders.start_call_count().await, 1);

    // No object count yet, so no diagnostic headers either
    assert!(response.header("x-exact-orders").is_none());
    assert!(response.header("server-timing").is_none());
    assert!(response.header("cache-control").is_some());
}

#[tokio::test]
async fn test_exact_count_interim_with_progress() {
    let fixture = TestFixture::new();
    fixture
        .orders
        .set_current_operation(Some(fixtures::running_operation(120)))
        .await;

    let response = fixture.get("/exact-order-count").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "RUNNING");
    assert_eq!(response.body["objectCount"], 120);

    assert_eq!(response.header("x-exact-orders"), Some("120"));
    assert_eq!(response.header("x-exact-status"), Some("RUNNING"));
    // Not completed, so no completion timestamp header
    assert!(response.header("x-exact-completed-at").is_none());
    assert!(response.header("server-timing").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_exact_count_start_suppressed() {
    let fixture = TestFixture::new();
    fixture.orders.set_start_sets_current(false).await;

    let first = fixture.get("/exact-order-count").await;
    assert_status!(first, StatusCode::OK);
    assert_eq!(fixture.orders.start_call_count().await, 1);

    let second = fixture.get("/exact-order-count").await;

    assert_status!(second, StatusCode::ACCEPTED);
    assert_eq!(second.body["status"], "PENDING");
    assert_eq!(
        second.body["message"],
        "Start suppressed to protect rate limits; try again shortly."
    );
    assert_eq!(fixture.orders.start_call_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_exact_count_wait_budget_exhausted() {
    let fixture = TestFixture::new();
    fixture
        .orders
        .set_current_operation(Some(fixtures::running_operation(5)))
        .await;

    let response = fixture
        .get("/exact-order-count?wait=1&timeoutMs=3000")
        .await;

    assert_status!(response, StatusCode::ACCEPTED);
    assert_eq!(response.body["status"], "RUNNING");
    assert_eq!(
        response.body["message"],
        "Still running, poll again or pass wait=1&timeoutMs=30000"
    );
}

#[tokio::test(start_paused = true)]
async fn test_exact_count_poll_to_completion() {
    let fixture = TestFixture::new();
    fixture
        .orders
        .push_current_operation(Some(fixtures::running_operation(10)))
        .await;
    fixture
        .orders
        .push_current_operation(Some(fixtures::completed_operation(250, 0)))
        .await;

    let response = fixture.get("/exact-order-count?wait=1").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "COMPLETED");
    assert_eq!(response.body["exactOrders"], 250);
    // The poll path reports no age
    assert!(response.body.get("ageMinutes").is_none());
    assert_eq!(response.header("x-exact-source"), Some("poll"));
}

#[tokio::test(start_paused = true)]
async fn test_exact_count_terminal_failure() {
    let fixture = TestFixture::new();
    fixture
        .orders
        .push_current_operation(Some(fixtures::running_operation(5)))
        .await;
    fixture
        .orders
        .push_current_operation(Some(fixtures::operation_with_status(BulkStatus::Failed)))
        .await;

    let response = fixture.get("/exact-order-count?wait=1").await;

    assert_status!(response, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["status"], "FAILED");
    assert_eq!(
        response.body["error"],
        "Bulk operation did not complete successfully"
    );
}

#[tokio::test]
async fn test_exact_count_start_rejected() {
    let fixture = TestFixture::new();
    fixture
        .orders
        .set_next_start_error(AdminApiError::StartRejected(
            "query: Invalid bulk query".to_string(),
        ))
        .await;

    let response = fixture.get("/exact-order-count").await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Failed to run exact order count");
    assert_eq!(response.body["detail"], "query: Invalid bulk query");
}

#[tokio::test]
async fn test_exact_count_upstream_failure() {
    let fixture = TestFixture::new();
    fixture
        .orders
        .set_next_error(AdminApiError::ConnectionFailed("dns".to_string()))
        .await;

    let response = fixture.get("/exact-order-count").await;

    assert_status!(response, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["error"], "Failed to run exact order count");
    assert!(response.body["detail"].is_string());
    // Even failures carry the CDN cache hint
    assert_eq!(
        response.header("cache-control"),
        Some("s-maxage=5, stale-while-revalidate=30")
    );
}

#[tokio::test]
async fn test_exact_count_filter_and_force() {
    let fixture = TestFixture::new();
    fixture
        .orders
        .set_current_operation(Some(fixtures::completed_operation(42, 5)))
        .await;

    let response = fixture
        .get("/exact-order-count?force=1&query=created_at%3A%3E2024-01-01")
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(
        fixture.orders.start_calls().await,
        vec![Some("created_at:>2024-01-01".to_string())]
    );
}

// =============================================================================
// Unconfigured state and CORS
// =============================================================================

#[tokio::test]
async fn test_unconfigured_endpoints_return_500() {
    let fixture = TestFixture::unconfigured();

    let total = fixture.get("/total-orders").await;
    assert_status!(total, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        total.body["error"],
        "Missing SHOPIFY_DOMAIN or SHOPIFY_ADMIN_API_ACCESS_TOKEN"
    );

    let exact = fixture.get("/exact-order-count").await;
    assert_status!(exact, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        exact.body["error"],
        "Missing SHOPIFY_DOMAIN or SHOPIFY_ADMIN_API_ACCESS_TOKEN"
    );
    // The cache hint applies to the unconfigured answer too
    assert!(exact.header("cache-control").is_some());

    // Health stays live without credentials
    let health = fixture.get("/health").await;
    assert_status!(health, StatusCode::OK);
}

#[tokio::test]
async fn test_cors_preflight() {
    let fixture = TestFixture::new();

    let response = fixture.preflight("/exact-order-count").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("access-control-allow-origin"), Some("*"));
    let methods = response
        .header("access-control-allow-methods")
        .unwrap_or_default();
    assert!(methods.contains("GET"), "methods were {methods}");
}

#[tokio::test]
async fn test_cors_headers_on_get() {
    let fixture = TestFixture::new();
    fixture
        .orders
        .set_current_operation(Some(fixtures::completed_operation(1, 1)))
        .await;

    let response = fixture.get("/exact-order-count").await;

    assert_eq!(response.header("access-control-allow-origin"), Some("*"));
}

// =============================================================================
// Parameter handling
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_zero_timeout_returns_immediately() {
    let fixture = TestFixture::new();
    fixture
        .orders
        .set_current_operation(Some(fixtures::running_operation(5)))
        .await;

    let response = fixture
        .get("/exact-order-count?wait=1&timeoutMs=0")
        .await;

    assert_status!(response, StatusCode::ACCEPTED);
    // Only the initial state read, no polling
    assert_eq!(fixture.orders.current_query_count().await, 1);
}

#[tokio::test]
async fn test_max_age_zero_rejects_fresh_result() {
    let fixture = TestFixture::new();
    fixture
        .orders
        .set_current_operation(Some(fixtures::completed_operation(42, 1)))
        .await;

    let response = fixture.get("/exact-order-count?maxAgeMinutes=0").await;

    // A zero horizon accepts nothing; the completed op is reported interim
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "COMPLETED");
    assert!(response.body.get("exactOrders").is_none());
    assert_eq!(response.body["objectCount"], 42);
}

#[tokio::test(start_paused = true)]
async fn test_custom_min_start_interval() {
    let fixture = TestFixture::new();
    fixture.orders.set_start_sets_current(false).await;

    let first = fixture.get("/exact-order-count").await;
    assert_status!(first, StatusCode::OK);

    // A short custom window expires quickly
    tokio::time::advance(Duration::from_millis(600)).await;
    let second = fixture
        .get("/exact-order-count?minStartIntervalMs=500")
        .await;

    assert_status!(second, StatusCode::OK);
    assert_eq!(fixture.orders.start_call_count().await, 2);
}
