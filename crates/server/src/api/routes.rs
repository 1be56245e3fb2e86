use axum::{
    http::{header, Method},
    middleware::from_fn,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::{handlers, middleware::metrics_middleware, orders};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Permissive CORS: the count endpoints are called from storefront
    // scripts on arbitrary origins. The layer answers preflight OPTIONS.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/total-orders", get(orders::total_orders))
        .route("/exact-order-count", get(orders::exact_order_count))
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        .layer(from_fn(metrics_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
