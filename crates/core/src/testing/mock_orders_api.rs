//! Mock Admin API for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{sleep, Duration};

use crate::shopify::{
    AdminApiError, BulkOperation, BulkStatus, CountPrecision, OrdersApi, OrdersCount,
};

/// Mock implementation of the OrdersApi trait.
///
/// Provides controllable behavior for testing:
/// - Script the sequence of `currentBulkOperation` responses
/// - Track start calls for assertions
/// - Simulate start latency and failures
///
/// # Example
///
/// ```rust,ignore
/// let api = MockOrdersApi::new();
///
/// // No current operation; the first query after a start sees RUNNING
/// api.set_current_operation(None).await;
///
/// let op = api.start_order_export(None).await?;
/// assert_eq!(op.status, BulkStatus::Running);
/// assert_eq!(api.start_call_count().await, 1);
/// ```
#[derive(Debug)]
pub struct MockOrdersApi {
    /// Sticky response for current_bulk_operation.
    current: Arc<RwLock<Option<BulkOperation>>>,
    /// Scripted responses consumed before the sticky value. Each popped
    /// entry becomes the new sticky value.
    current_script: Arc<RwLock<VecDeque<Option<BulkOperation>>>>,
    /// Recorded start_order_export filters.
    start_calls: Arc<RwLock<Vec<Option<String>>>>,
    /// Recorded orders_count filters.
    orders_count_calls: Arc<RwLock<Vec<Option<String>>>>,
    /// Number of current_bulk_operation queries.
    current_queries: Arc<RwLock<u32>>,
    /// Number of orders_count_rest calls.
    rest_calls: Arc<RwLock<u32>>,
    /// Result for orders_count.
    orders_count_result: Arc<RwLock<OrdersCount>>,
    /// Result for orders_count_rest.
    rest_count: Arc<RwLock<u64>>,
    /// Queued errors; each count/current query consumes one.
    next_errors: Arc<RwLock<VecDeque<AdminApiError>>>,
    /// If set, the next start_order_export fails with this error.
    next_start_error: Arc<RwLock<Option<AdminApiError>>>,
    /// Whether a successful start installs the started op as current
    /// (default: true).
    start_sets_current: Arc<RwLock<bool>>,
    /// Simulated latency for start_order_export.
    start_delay: Arc<RwLock<Duration>>,
    /// Counter for generating operation ids.
    id_counter: Arc<RwLock<u32>>,
}

impl Default for MockOrdersApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockOrdersApi {
    /// Create a new mock Admin API with no current operation.
    pub fn new() -> Self {
        Self {
            current: Arc::new(RwLock::new(None)),
            current_script: Arc::new(RwLock::new(VecDeque::new())),
            start_calls: Arc::new(RwLock::new(Vec::new())),
            orders_count_calls: Arc::new(RwLock::new(Vec::new())),
            current_queries: Arc::new(RwLock::new(0)),
            rest_calls: Arc::new(RwLock::new(0)),
            orders_count_result: Arc::new(RwLock::new(OrdersCount {
                count: 0,
                precision: Some(CountPrecision::Exact),
            })),
            rest_count: Arc::new(RwLock::new(0)),
            next_errors: Arc::new(RwLock::new(VecDeque::new())),
            next_start_error: Arc::new(RwLock::new(None)),
            start_sets_current: Arc::new(RwLock::new(true)),
            start_delay: Arc::new(RwLock::new(Duration::ZERO)),
            id_counter: Arc::new(RwLock::new(0)),
        }
    }

    /// Set the sticky current operation.
    pub async fn set_current_operation(&self, op: Option<BulkOperation>) {
        *self.current.write().await = op;
    }

    /// Queue a scripted current_bulk_operation response.
    pub async fn push_current_operation(&self, op: Option<BulkOperation>) {
        self.current_script.write().await.push_back(op);
    }

    /// Set the orders_count result.
    pub async fn set_orders_count(&self, count: u64, precision: Option<CountPrecision>) {
        *self.orders_count_result.write().await = OrdersCount { count, precision };
    }

    /// Set the orders_count_rest result.
    pub async fn set_rest_count(&self, count: u64) {
        *self.rest_count.write().await = count;
    }

    /// Queue an error; the next count/current query consumes it.
    pub async fn set_next_error(&self, error: AdminApiError) {
        self.next_errors.write().await.push_back(error);
    }

    /// Configure the next start_order_export to fail with the given error.
    pub async fn set_next_start_error(&self, error: AdminApiError) {
        *self.next_start_error.write().await = Some(error);
    }

    /// Control whether a successful start installs the op as current.
    pub async fn set_start_sets_current(&self, enabled: bool) {
        *self.start_sets_current.write().await = enabled;
    }

    /// Simulate latency for start_order_export.
    pub async fn set_start_delay(&self, delay: Duration) {
        *self.start_delay.write().await = delay;
    }

    /// All recorded start filters, in call order.
    pub async fn start_calls(&self) -> Vec<Option<String>> {
        self.start_calls.read().await.clone()
    }

    pub async fn start_call_count(&self) -> usize {
        self.start_calls.read().await.len()
    }

    /// All recorded orders_count filters, in call order.
    pub async fn orders_count_calls(&self) -> Vec<Option<String>> {
        self.orders_count_calls.read().await.clone()
    }

    pub async fn current_query_count(&self) -> u32 {
        *self.current_queries.read().await
    }

    pub async fn rest_call_count(&self) -> u32 {
        *self.rest_calls.read().await
    }

    /// Take the next queued error if any.
    async fn take_error(&self) -> Option<AdminApiError> {
        self.next_errors.write().await.pop_front()
    }

    async fn generate_operation(&self) -> BulkOperation {
        let mut counter = self.id_counter.write().await;
        *counter += 1;
        BulkOperation {
            id: format!("gid://shopify/BulkOperation/{}", *counter),
            status: BulkStatus::Running,
            object_count: None,
            created_at: Some(Utc::now()),
            url: None,
            partial_data_url: None,
        }
    }
}

#[async_trait]
impl OrdersApi for MockOrdersApi {
    fn name(&self) -> &str {
        "mock"
    }

    async fn orders_count(&self, filter: Option<&str>) -> Result<OrdersCount, AdminApiError> {
        self.orders_count_calls
            .write()
            .await
            .push(filter.map(str::to_string));

        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        Ok(self.orders_count_result.read().await.clone())
    }

    async fn orders_count_rest(&self) -> Result<u64, AdminApiError> {
        *self.rest_calls.write().await += 1;

        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        Ok(*self.rest_count.read().await)
    }

    async fn current_bulk_operation(&self) -> Result<Option<BulkOperation>, AdminApiError> {
        *self.current_queries.write().await += 1;

        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        if let Some(scripted) = self.current_script.write().await.pop_front() {
            *self.current.write().await = scripted.clone();
            return Ok(scripted);
        }

        Ok(self.current.read().await.clone())
    }

    async fn start_order_export(
        &self,
        filter: Option<&str>,
    ) -> Result<BulkOperation, AdminApiError> {
        self.start_calls
            .write()
            .await
            .push(filter.map(str::to_string));

        let delay = *self.start_delay.read().await;
        if delay > Duration::ZERO {
            sleep(delay).await;
        }

        if let Some(err) = self.next_start_error.write().await.take() {
            return Err(err);
        }

        let op = self.generate_operation().await;
        if *self.start_sets_current.read().await {
            *self.current.write().await = Some(op.clone());
        }
        Ok(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_scripted_responses_become_sticky() {
        let api = MockOrdersApi::new();
        api.push_current_operation(Some(fixtures::running_operation(5)))
            .await;

        let first = api.current_bulk_operation().await.unwrap().unwrap();
        assert_eq!(first.status, BulkStatus::Running);

        // Script exhausted; the popped value persists
        let second = api.current_bulk_operation().await.unwrap().unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(api.current_query_count().await, 2);
    }

    #[tokio::test]
    async fn test_start_installs_current_operation() {
        let api = MockOrdersApi::new();
        assert!(api.current_bulk_operation().await.unwrap().is_none());

        let op = api.start_order_export(Some("status:open")).await.unwrap();
        assert_eq!(op.status, BulkStatus::Running);

        let current = api.current_bulk_operation().await.unwrap().unwrap();
        assert_eq!(current.id, op.id);
        assert_eq!(api.start_calls().await, vec![Some("status:open".to_string())]);
    }

    #[tokio::test]
    async fn test_start_without_installing_current() {
        let api = MockOrdersApi::new();
        api.set_start_sets_current(false).await;

        api.start_order_export(None).await.unwrap();
        assert!(api.current_bulk_operation().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_error_queue_is_consumed_in_order() {
        let api = MockOrdersApi::new();
        api.set_next_error(AdminApiError::Timeout).await;
        api.set_next_error(AdminApiError::ConnectionFailed("down".to_string()))
            .await;

        assert!(matches!(
            api.orders_count(None).await,
            Err(AdminApiError::Timeout)
        ));
        assert!(matches!(
            api.orders_count_rest().await,
            Err(AdminApiError::ConnectionFailed(_))
        ));
        assert!(api.orders_count(None).await.is_ok());
    }

    #[tokio::test]
    async fn test_start_error_is_consumed() {
        let api = MockOrdersApi::new();
        api.set_next_start_error(AdminApiError::StartRejected("bad filter".to_string()))
            .await;

        assert!(api.start_order_export(None).await.is_err());
        assert!(api.start_order_export(None).await.is_ok());
        // Both attempts are recorded
        assert_eq!(api.start_call_count().await, 2);
    }
}
