//! Shopify Admin API client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::ShopifyConfig;
use crate::metrics::{ADMIN_REQUESTS, ADMIN_REQUEST_DURATION};

use super::graphql;
use super::{AdminApiError, BulkOperation, BulkStatus, CountPrecision, OrdersApi, OrdersCount};

/// Admin API client speaking GraphQL, with a REST fallback for order counts.
pub struct AdminClient {
    client: Client,
    config: ShopifyConfig,
}

impl AdminClient {
    /// Create a new AdminClient with the given configuration.
    pub fn new(config: ShopifyConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    fn graphql_url(&self) -> String {
        format!(
            "https://{}/admin/api/{}/graphql.json",
            self.config.domain, self.config.api_version
        )
    }

    fn rest_orders_count_url(&self) -> String {
        format!(
            "https://{}/admin/api/{}/orders/count.json",
            self.config.domain, self.config.api_version
        )
    }

    /// Execute a GraphQL request and return its `data` payload.
    async fn graphql(
        &self,
        operation: &'static str,
        query: &str,
        variables: Option<Value>,
    ) -> Result<Value, AdminApiError> {
        let start = Instant::now();
        let result = self.execute_graphql(query, variables).await;

        let status = match &result {
            Ok(_) => "ok",
            Err(AdminApiError::Timeout) => "timeout",
            Err(_) => "error",
        };
        ADMIN_REQUESTS.with_label_values(&[operation, status]).inc();
        ADMIN_REQUEST_DURATION
            .with_label_values(&[operation])
            .observe(start.elapsed().as_secs_f64());

        result
    }

    async fn execute_graphql(
        &self,
        query: &str,
        variables: Option<Value>,
    ) -> Result<Value, AdminApiError> {
        let mut body = json!({ "query": query });
        if let Some(variables) = variables {
            body["variables"] = variables;
        }

        let response = self
            .client
            .post(self.graphql_url())
            .header("X-Shopify-Access-Token", &self.config.access_token)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AdminApiError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| AdminApiError::ApiError(format!("Failed to parse response: {}", e)))?;

        // GraphQL reports failures with HTTP 200 and a top-level errors array
        if let Some(errors) = payload.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                let messages: Vec<&str> = errors
                    .iter()
                    .map(|e| {
                        e.get("message")
                            .and_then(Value::as_str)
                            .unwrap_or("unknown error")
                    })
                    .collect();
                return Err(AdminApiError::ApiError(messages.join("; ")));
            }
        }

        payload
            .get("data")
            .filter(|data| !data.is_null())
            .cloned()
            .ok_or_else(|| AdminApiError::ApiError("Response carried no data".to_string()))
    }

    async fn execute_rest_count(&self) -> Result<u64, AdminApiError> {
        let response = self
            .client
            .get(self.rest_orders_count_url())
            .header("X-Shopify-Access-Token", &self.config.access_token)
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AdminApiError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let payload: RestOrdersCount = response
            .json()
            .await
            .map_err(|e| AdminApiError::ApiError(format!("Failed to parse response: {}", e)))?;

        debug!(count = payload.count, "orders count fetched via REST");
        Ok(payload.count)
    }
}

#[async_trait]
impl OrdersApi for AdminClient {
    fn name(&self) -> &str {
        "shopify-admin"
    }

    async fn orders_count(&self, filter: Option<&str>) -> Result<OrdersCount, AdminApiError> {
        let data = self
            .graphql(
                "orders_count",
                graphql::ORDERS_COUNT,
                Some(json!({ "query": filter })),
            )
            .await?;

        let data: OrdersCountData = serde_json::from_value(data)
            .map_err(|e| AdminApiError::ApiError(format!("Failed to parse ordersCount: {}", e)))?;

        let counted = data
            .orders_count
            .ok_or_else(|| AdminApiError::ApiError("ordersCount returned null".to_string()))?;

        debug!(count = counted.count, "orders count fetched");
        Ok(OrdersCount {
            count: counted.count,
            precision: counted.precision,
        })
    }

    async fn orders_count_rest(&self) -> Result<u64, AdminApiError> {
        let start = Instant::now();
        let result = self.execute_rest_count().await;

        let status = match &result {
            Ok(_) => "ok",
            Err(AdminApiError::Timeout) => "timeout",
            Err(_) => "error",
        };
        ADMIN_REQUESTS
            .with_label_values(&["orders_count_rest", status])
            .inc();
        ADMIN_REQUEST_DURATION
            .with_label_values(&["orders_count_rest"])
            .observe(start.elapsed().as_secs_f64());

        result
    }

    async fn current_bulk_operation(&self) -> Result<Option<BulkOperation>, AdminApiError> {
        let data = self
            .graphql(
                "current_bulk_operation",
                graphql::CURRENT_BULK_OPERATION,
                None,
            )
            .await?;

        let data: CurrentBulkOperationData = serde_json::from_value(data).map_err(|e| {
            AdminApiError::ApiError(format!("Failed to parse currentBulkOperation: {}", e))
        })?;

        Ok(data
            .current_bulk_operation
            .map(BulkOperationWire::into_bulk_operation))
    }

    async fn start_order_export(
        &self,
        filter: Option<&str>,
    ) -> Result<BulkOperation, AdminApiError> {
        let mutation = graphql::bulk_order_export_mutation(filter);
        let data = self
            .graphql("bulk_operation_run_query", &mutation, None)
            .await?;

        let data: BulkRunData = serde_json::from_value(data).map_err(|e| {
            AdminApiError::ApiError(format!("Failed to parse bulkOperationRunQuery: {}", e))
        })?;

        let run = data.bulk_operation_run_query.ok_or_else(|| {
            AdminApiError::ApiError("bulkOperationRunQuery returned null".to_string())
        })?;

        if !run.user_errors.is_empty() {
            let detail = format_user_errors(&run.user_errors);
            warn!(detail = %detail, "bulk operation start rejected");
            return Err(AdminApiError::StartRejected(detail));
        }

        let op = run
            .bulk_operation
            .ok_or_else(|| {
                AdminApiError::ApiError("bulkOperationRunQuery returned no operation".to_string())
            })?
            .into_bulk_operation();

        info!(id = %op.id, status = %op.status, "bulk order export started");
        Ok(op)
    }
}

fn map_transport_error(e: reqwest::Error) -> AdminApiError {
    if e.is_timeout() {
        AdminApiError::Timeout
    } else if e.is_connect() {
        AdminApiError::ConnectionFailed(e.to_string())
    } else {
        AdminApiError::ApiError(e.to_string())
    }
}

fn format_user_errors(errors: &[UserError]) -> String {
    errors
        .iter()
        .map(|e| match &e.field {
            Some(field) if !field.is_empty() => format!("{}: {}", field.join("."), e.message),
            _ => e.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

// Admin API wire types
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentBulkOperationData {
    #[serde(default)]
    current_bulk_operation: Option<BulkOperationWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkOperationWire {
    id: String,
    status: String,
    /// Shopify serializes this UnsignedInt64 as a decimal string.
    #[serde(default)]
    object_count: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    partial_data_url: Option<String>,
}

impl BulkOperationWire {
    fn into_bulk_operation(self) -> BulkOperation {
        BulkOperation {
            id: self.id,
            status: BulkStatus::parse(&self.status),
            object_count: self.object_count.and_then(|count| count.parse().ok()),
            created_at: self.created_at,
            url: self.url,
            partial_data_url: self.partial_data_url,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrdersCountData {
    #[serde(default)]
    orders_count: Option<OrdersCountWire>,
}

#[derive(Debug, Deserialize)]
struct OrdersCountWire {
    count: u64,
    #[serde(default)]
    precision: Option<CountPrecision>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkRunData {
    #[serde(default)]
    bulk_operation_run_query: Option<BulkRunPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkRunPayload {
    #[serde(default)]
    bulk_operation: Option<BulkOperationWire>,
    #[serde(default)]
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
struct UserError {
    #[serde(default)]
    field: Option<Vec<String>>,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RestOrdersCount {
    count: u64,
}
