use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::count::CountConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    /// Shopify Admin API credentials (the server starts without them, but
    /// the order endpoints report the missing configuration)
    #[serde(default)]
    pub shopify: Option<ShopifyConfig>,
    #[serde(default)]
    pub count: CountConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            shopify: None,
            count: CountConfig::default(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Shopify Admin API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShopifyConfig {
    /// Shop domain as a bare hostname (e.g., "my-shop.myshopify.com")
    pub domain: String,
    /// Admin API access token (never logged, never echoed back)
    pub access_token: String,
    /// Admin API version (default: "2025-07")
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl ShopifyConfig {
    /// Builds a config from bare credentials, with defaults for everything else.
    pub fn from_credentials(domain: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            access_token: access_token.into(),
            api_version: default_api_version(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_api_version() -> String {
    "2025-07".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shopify: Option<SanitizedShopifyConfig>,
    pub count: CountConfig,
}

/// Sanitized Shopify config (access token hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedShopifyConfig {
    pub domain: String,
    pub api_version: String,
    pub access_token_configured: bool,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            shopify: config.shopify.as_ref().map(|s| SanitizedShopifyConfig {
                domain: s.domain.clone(),
                api_version: s.api_version.clone(),
                access_token_configured: !s.access_token.is_empty(),
                timeout_secs: s.timeout_secs,
            }),
            count: config.count.clone(),
        }
    }
}
