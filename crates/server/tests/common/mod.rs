//! Common test utilities for in-process API testing with mocks.
//!
//! The fixture builds the full router with a [`MockOrdersApi`] injected in
//! place of the real Admin API client; requests go through `oneshot`
//! without binding a socket.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use tally_core::testing::MockOrdersApi;
use tally_core::{Config, CountConfig, CountOrchestrator, OrdersApi, ShopifyConfig};
use tally_server::api::create_router;
use tally_server::state::AppState;

/// Re-export fixtures for test convenience
#[allow(unused_imports)]
pub use tally_core::testing::fixtures;

/// Test fixture exercising the HTTP boundary against a mock Admin API.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock Admin API - script operations, record calls
    pub orders: Arc<MockOrdersApi>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl TestFixture {
    /// Create a new test fixture with default configuration.
    pub fn new() -> Self {
        Self::with_count_config(CountConfig::default())
    }

    /// Create a test fixture with a custom count configuration.
    pub fn with_count_config(count: CountConfig) -> Self {
        let orders = Arc::new(MockOrdersApi::new());

        let mut config = Config::default();
        config.shopify = Some(ShopifyConfig::from_credentials(
            "test-shop.myshopify.com",
            "shpat_test_token",
        ));
        config.count = count.clone();

        let orchestrator = Arc::new(CountOrchestrator::new(
            count,
            Arc::clone(&orders) as Arc<dyn OrdersApi>,
        ));
        let state = Arc::new(AppState::new(
            config,
            Some(Arc::clone(&orders) as Arc<dyn OrdersApi>),
            Some(orchestrator),
        ));

        Self {
            router: create_router(state),
            orders,
        }
    }

    /// A fixture without Shopify credentials: no client, no orchestrator.
    pub fn unconfigured() -> Self {
        let orders = Arc::new(MockOrdersApi::new());
        let state = Arc::new(AppState::new(Config::default(), None, None));
        Self {
            router: create_router(state),
            orders,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.request(request).await
    }

    /// Send a GET request and return the raw body (for non-JSON endpoints).
    pub async fn get_raw(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&body_bytes).to_string())
    }

    /// Send a CORS preflight request.
    pub async fn preflight(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("OPTIONS")
            .uri(path)
            .header("Origin", "https://shop.example")
            .header("Access-Control-Request-Method", "GET")
            .body(Body::empty())
            .unwrap();
        self.request(request).await
    }

    /// Send a request to the test server.
    async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
