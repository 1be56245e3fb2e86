//! Types for the Shopify Admin API integration.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Lifecycle status of a Shopify bulk operation.
///
/// Anything the platform reports outside this set collapses to `Unknown`;
/// callers must treat `Unknown` as "neither done nor dead".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BulkStatus {
    Idle,
    Running,
    Completed,
    Failed,
    Canceled,
    Expired,
    #[serde(other)]
    Unknown,
}

impl BulkStatus {
    /// Parse the status string reported by the Admin API.
    pub fn parse(value: &str) -> Self {
        match value {
            "IDLE" => BulkStatus::Idle,
            "RUNNING" => BulkStatus::Running,
            "COMPLETED" => BulkStatus::Completed,
            "FAILED" => BulkStatus::Failed,
            "CANCELED" => BulkStatus::Canceled,
            "EXPIRED" => BulkStatus::Expired,
            _ => BulkStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BulkStatus::Idle => "IDLE",
            BulkStatus::Running => "RUNNING",
            BulkStatus::Completed => "COMPLETED",
            BulkStatus::Failed => "FAILED",
            BulkStatus::Canceled => "CANCELED",
            BulkStatus::Expired => "EXPIRED",
            BulkStatus::Unknown => "UNKNOWN",
        }
    }

    /// FAILED, CANCELED and EXPIRED operations never produce a result.
    pub fn is_terminal_failure(&self) -> bool {
        matches!(
            self,
            BulkStatus::Failed | BulkStatus::Canceled | BulkStatus::Expired
        )
    }
}

impl fmt::Display for BulkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Shopify bulk operation as reported by `currentBulkOperation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkOperation {
    /// Operation GID, e.g. "gid://shopify/BulkOperation/123".
    pub id: String,
    pub status: BulkStatus,
    /// Number of objects processed so far (exact once COMPLETED).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_count: Option<u64>,
    /// When the operation was created. Shopify does not expose a separate
    /// completion timestamp, so this doubles as the result's age reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Result file URL (present once COMPLETED).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Partial result file URL (present for some failed operations).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_data_url: Option<String>,
}

impl BulkOperation {
    /// Age of the operation in minutes, or None when no timestamp is known.
    pub fn age_minutes(&self, now: DateTime<Utc>) -> Option<f64> {
        self.created_at
            .map(|created_at| (now - created_at).num_milliseconds() as f64 / 60_000.0)
    }
}

/// Order count as reported by the `ordersCount` query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdersCount {
    pub count: u64,
    /// Whether the count is exact or a lower bound. Absent when the count
    /// came from the REST fallback, which reports no precision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<CountPrecision>,
}

/// Precision qualifier attached to `ordersCount` results.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CountPrecision {
    Exact,
    AtLeast,
}

/// Errors from the Admin API boundary.
///
/// Clone is deliberate: a single upstream failure fans out to every request
/// joined on the same in-flight bulk operation start.
#[derive(Debug, Clone, Error)]
pub enum AdminApiError {
    #[error("Admin API connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Admin API error: {0}")]
    ApiError(String),

    #[error("Bulk operation start rejected: {0}")]
    StartRejected(String),

    #[error("Request timeout")]
    Timeout,
}

/// Trait for the Shopify Admin API operations the count pipeline needs.
#[async_trait]
pub trait OrdersApi: Send + Sync {
    /// Client name for logging.
    fn name(&self) -> &str;

    /// Approximate order count via the `ordersCount` GraphQL query,
    /// optionally narrowed by an order search filter.
    async fn orders_count(&self, filter: Option<&str>) -> Result<OrdersCount, AdminApiError>;

    /// Order count via the deprecated REST endpoint. Last-resort fallback.
    async fn orders_count_rest(&self) -> Result<u64, AdminApiError>;

    /// The shop's current (most recent) bulk operation, if any.
    async fn current_bulk_operation(&self) -> Result<Option<BulkOperation>, AdminApiError>;

    /// Start a bulk operation exporting one line per order id.
    async fn start_order_export(
        &self,
        filter: Option<&str>,
    ) -> Result<BulkOperation, AdminApiError>;
}
