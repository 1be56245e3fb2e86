use std::sync::Arc;
use tally_core::{Config, CountOrchestrator, OrdersApi, SanitizedConfig};

/// Shared application state
///
/// `orders` and `orchestrator` are `None` when no Shopify credentials are
/// configured; the order-count endpoints then answer with a 500 while
/// health, config and metrics stay live.
pub struct AppState {
    config: Config,
    orders: Option<Arc<dyn OrdersApi>>,
    orchestrator: Option<Arc<CountOrchestrator>>,
}

impl AppState {
    pub fn new(
        config: Config,
        orders: Option<Arc<dyn OrdersApi>>,
        orchestrator: Option<Arc<CountOrchestrator>>,
    ) -> Self {
        Self {
            config,
            orders,
            orchestrator,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn orders(&self) -> Option<&Arc<dyn OrdersApi>> {
        self.orders.as_ref()
    }

    pub fn orchestrator(&self) -> Option<&Arc<CountOrchestrator>> {
        self.orchestrator.as_ref()
    }
}
