pub mod config;
pub mod count;
pub mod metrics;
pub mod shopify;
pub mod testing;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config, ConfigError,
    SanitizedConfig, ServerConfig, ShopifyConfig,
};
pub use count::{
    CachedCount, CompletedCount, CountCache, CountConfig, CountError, CountOrchestrator,
    CountSource, ExactCountOutcome, ExactCountRequest, StartError, StartGate,
};
pub use shopify::{
    AdminApiError, AdminClient, BulkOperation, BulkStatus, CountPrecision, OrdersApi, OrdersCount,
};
