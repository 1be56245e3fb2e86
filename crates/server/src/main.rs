use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tally_core::{
    load_config, load_config_from_env, validate_config, AdminClient, CountOrchestrator, OrdersApi,
};

use tally_server::api::create_router;
use tally_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration: explicit path, default file, or environment alone
    let config = match std::env::var("TALLY_CONFIG") {
        Ok(path) => {
            let path = PathBuf::from(path);
            info!("Loading configuration from {:?}", path);
            load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))?
        }
        Err(_) if Path::new("tally.toml").exists() => {
            info!("Loading configuration from tally.toml");
            load_config(Path::new("tally.toml"))
                .context("Failed to load config from tally.toml")?
        }
        Err(_) => {
            info!("No config file found, loading configuration from environment");
            load_config_from_env().context("Failed to load config from environment")?
        }
    };

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;
    info!("Configuration loaded successfully");

    // Create the Admin API client if credentials are configured. Without
    // credentials the server still runs; the count endpoints answer 500.
    let orders: Option<Arc<dyn OrdersApi>> = match &config.shopify {
        Some(shopify) => {
            info!(
                domain = %shopify.domain,
                api_version = %shopify.api_version,
                "Initializing Shopify Admin API client"
            );
            Some(Arc::new(AdminClient::new(shopify.clone())))
        }
        None => {
            warn!("Shopify credentials not configured; order-count endpoints will return errors");
            None
        }
    };

    // Create the exact-count orchestrator
    let orchestrator = orders
        .as_ref()
        .map(|api| Arc::new(CountOrchestrator::new(config.count.clone(), Arc::clone(api))));

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), orders, orchestrator));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
