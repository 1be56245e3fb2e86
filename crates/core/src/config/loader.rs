use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError, ShopifyConfig};

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let mut config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("TALLY_").split("_"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    apply_legacy_shopify_env(&mut config);
    Ok(config)
}

/// Load configuration from environment variables alone (no config file)
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    let mut config: Config = Figment::new()
        .merge(Env::prefixed("TALLY_").split("_"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    apply_legacy_shopify_env(&mut config);
    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Fill in the `[shopify]` section from the bare SHOPIFY_* environment
/// variables when no section is configured. An explicit config always wins.
fn apply_legacy_shopify_env(config: &mut Config) {
    if config.shopify.is_some() {
        return;
    }
    config.shopify = shopify_from_env_vars(
        std::env::var("SHOPIFY_DOMAIN").ok(),
        std::env::var("SHOPIFY_ADMIN_API_ACCESS_TOKEN").ok(),
        std::env::var("SHOPIFY_TOKEN").ok(),
    );
}

/// SHOPIFY_ADMIN_API_ACCESS_TOKEN wins over the legacy SHOPIFY_TOKEN.
/// Returns None unless both a domain and a token are present and non-empty.
fn shopify_from_env_vars(
    domain: Option<String>,
    access_token: Option<String>,
    legacy_token: Option<String>,
) -> Option<ShopifyConfig> {
    let domain = domain.filter(|v| !v.is_empty())?;
    let token = access_token
        .filter(|v| !v.is_empty())
        .or(legacy_token.filter(|v| !v.is_empty()))?;
    Some(ShopifyConfig::from_credentials(domain, token))
}
