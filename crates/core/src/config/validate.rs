use super::{types::Config, ConfigError};
use crate::count::{MAX_AGE_CAP_MINUTES, MAX_WAIT_MS, MIN_START_INTERVAL_CAP_MS};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Shopify domain/token are non-empty and the domain carries no scheme
/// - Count defaults stay within the request caps
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Shopify validation (only when the section is present)
    if let Some(shopify) = &config.shopify {
        if shopify.domain.is_empty() {
            return Err(ConfigError::ValidationError(
                "shopify.domain cannot be empty".to_string(),
            ));
        }
        if shopify.domain.contains("://") {
            return Err(ConfigError::ValidationError(
                "shopify.domain must be a bare hostname, without scheme".to_string(),
            ));
        }
        if shopify.access_token.is_empty() {
            return Err(ConfigError::ValidationError(
                "shopify.access_token cannot be empty".to_string(),
            ));
        }
    }

    // Count validation
    if config.count.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "count.poll_interval_ms cannot be 0".to_string(),
        ));
    }
    if config.count.default_wait_timeout_ms > MAX_WAIT_MS {
        return Err(ConfigError::ValidationError(format!(
            "count.default_wait_timeout_ms cannot exceed {}",
            MAX_WAIT_MS
        )));
    }
    if config.count.default_max_age_minutes > MAX_AGE_CAP_MINUTES {
        return Err(ConfigError::ValidationError(format!(
            "count.default_max_age_minutes cannot exceed {}",
            MAX_AGE_CAP_MINUTES
        )));
    }
    if config.count.default_min_start_interval_ms > MIN_START_INTERVAL_CAP_MS {
        return Err(ConfigError::ValidationError(format!(
            "count.default_min_start_interval_ms cannot exceed {}",
            MIN_START_INTERVAL_CAP_MS
        )));
    }

    Ok(())
}
