//! Testing utilities and mock implementations for E2E tests.
//!
//! This module provides a mock Admin API, allowing the whole count pipeline
//! to be exercised without a Shopify shop.
//!
//! # Example
//!
//! ```rust,ignore
//! use tally_core::testing::{fixtures, MockOrdersApi};
//!
//! let api = MockOrdersApi::new();
//!
//! // Configure mock responses
//! api.set_current_operation(Some(fixtures::completed_operation(42, 10))).await;
//! api.set_orders_count(1042, Some(CountPrecision::Exact)).await;
//!
//! // Use in a CountOrchestrator or AppState...
//! ```

mod mock_orders_api;

pub use mock_orders_api::MockOrdersApi;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{Duration, Utc};

    use crate::shopify::{BulkOperation, BulkStatus};

    /// Create a completed export whose result landed `age_minutes` ago.
    pub fn completed_operation(object_count: u64, age_minutes: i64) -> BulkOperation {
        BulkOperation {
            id: "gid://shopify/BulkOperation/900".to_string(),
            status: BulkStatus::Completed,
            object_count: Some(object_count),
            created_at: Some(Utc::now() - Duration::minutes(age_minutes)),
            url: Some("https://storage.example/result.jsonl".to_string()),
            partial_data_url: None,
        }
    }

    /// Create an export still underway, with a partial object count.
    pub fn running_operation(object_count: u64) -> BulkOperation {
        BulkOperation {
            id: "gid://shopify/BulkOperation/901".to_string(),
            status: BulkStatus::Running,
            object_count: Some(object_count),
            created_at: Some(Utc::now()),
            url: None,
            partial_data_url: None,
        }
    }

    /// Create a bare operation in the given state, with nothing else known.
    pub fn operation_with_status(status: BulkStatus) -> BulkOperation {
        BulkOperation {
            id: "gid://shopify/BulkOperation/902".to_string(),
            status,
            object_count: None,
            created_at: None,
            url: None,
            partial_data_url: None,
        }
    }
}
