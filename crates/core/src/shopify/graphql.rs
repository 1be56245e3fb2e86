//! GraphQL documents sent to the Admin API.

/// Fetches the shop's current bulk operation. Shopify tracks a single
/// query-type bulk operation per shop, so no id is needed.
pub const CURRENT_BULK_OPERATION: &str =
    "query { currentBulkOperation { id status type objectCount url partialDataUrl createdAt } }";

/// Order count with an optional order search filter.
pub const ORDERS_COUNT: &str = r#"
query OrdersCount($query: String) {
  ordersCount(query: $query) {
    count
    precision
  }
}
"#;

/// Builds the mutation starting a bulk export of one line per order id.
///
/// The inner document is embedded as a GraphQL block string; the filter is
/// escaped for the double-quoted string it lands in.
pub fn bulk_order_export_mutation(filter: Option<&str>) -> String {
    let filter_clause = match filter {
        Some(filter) => format!(", query: \"{}\"", escape_filter(filter)),
        None => String::new(),
    };
    format!(
        r#"mutation Run {{
  bulkOperationRunQuery(query: """
    {{
      orders(first: 250{filter_clause}) {{
        edges {{ node {{ id }} }}
      }}
    }}
  """) {{
    bulkOperation {{ id status type }}
    userErrors {{ field message }}
  }}
}}"#
    )
}

/// Escapes backslashes then double quotes, in that order.
pub fn escape_filter(input: &str) -> String {
    input.replace('\\', "\\\\").replace('"', "\\\"")
}
