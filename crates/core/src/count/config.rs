//! Configuration for the exact-count pipeline.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Hard cap on the per-request wait budget, in milliseconds.
pub const MAX_WAIT_MS: u64 = 30_000;

/// Hard cap on the per-request freshness horizon, in minutes.
pub const MAX_AGE_CAP_MINUTES: u32 = 1_440;

/// Hard cap on the per-request start suppression interval, in milliseconds.
pub const MIN_START_INTERVAL_CAP_MS: u64 = 300_000;

/// Exact-count pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CountConfig {
    /// Freshness horizon in minutes applied when a request names none (default: 60)
    #[serde(default = "default_max_age_minutes")]
    pub default_max_age_minutes: u32,
    /// Wait budget in milliseconds applied when a request names none (default: 18000)
    #[serde(default = "default_wait_timeout_ms")]
    pub default_wait_timeout_ms: u64,
    /// Suppression interval in milliseconds between bulk operation starts (default: 60000)
    #[serde(default = "default_min_start_interval_ms")]
    pub default_min_start_interval_ms: u64,
    /// Delay between completion polls in milliseconds (default: 1400)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for CountConfig {
    fn default() -> Self {
        Self {
            default_max_age_minutes: default_max_age_minutes(),
            default_wait_timeout_ms: default_wait_timeout_ms(),
            default_min_start_interval_ms: default_min_start_interval_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl CountConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Requested wait budget clamped to [0, MAX_WAIT_MS]; the configured
    /// default when the request names none.
    pub fn clamp_wait_timeout(&self, requested: Option<i64>) -> Duration {
        Duration::from_millis(clamp_to_cap(
            requested,
            self.default_wait_timeout_ms,
            MAX_WAIT_MS,
        ))
    }

    /// Requested freshness horizon clamped to [0, MAX_AGE_CAP_MINUTES].
    pub fn clamp_max_age_minutes(&self, requested: Option<i64>) -> u32 {
        clamp_to_cap(
            requested,
            self.default_max_age_minutes as u64,
            MAX_AGE_CAP_MINUTES as u64,
        ) as u32
    }

    /// Requested suppression interval clamped to [0, MIN_START_INTERVAL_CAP_MS].
    pub fn clamp_min_start_interval(&self, requested: Option<i64>) -> Duration {
        Duration::from_millis(clamp_to_cap(
            requested,
            self.default_min_start_interval_ms,
            MIN_START_INTERVAL_CAP_MS,
        ))
    }
}

fn clamp_to_cap(requested: Option<i64>, default: u64, cap: u64) -> u64 {
    match requested {
        Some(value) => value.clamp(0, cap as i64) as u64,
        None => default.min(cap),
    }
}

fn default_max_age_minutes() -> u32 {
    60
}

fn default_wait_timeout_ms() -> u64 {
    18_000
}

fn default_min_start_interval_ms() -> u64 {
    60_000
}

fn default_poll_interval_ms() -> u64 {
    1_400
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CountConfig::default();
        assert_eq!(config.default_max_age_minutes, 60);
        assert_eq!(config.default_wait_timeout_ms, 18_000);
        assert_eq!(config.default_min_start_interval_ms, 60_000);
        assert_eq!(config.poll_interval_ms, 1_400);
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let toml = r#"
default_max_age_minutes = 15
poll_interval_ms = 200
"#;
        let config: CountConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.default_max_age_minutes, 15);
        assert_eq!(config.poll_interval_ms, 200);
        assert_eq!(config.default_wait_timeout_ms, 18_000); // default
    }

    #[test]
    fn test_clamp_wait_timeout() {
        let config = CountConfig::default();
        assert_eq!(
            config.clamp_wait_timeout(None),
            Duration::from_millis(18_000)
        );
        assert_eq!(
            config.clamp_wait_timeout(Some(5_000)),
            Duration::from_millis(5_000)
        );
        assert_eq!(config.clamp_wait_timeout(Some(0)), Duration::ZERO);
        assert_eq!(config.clamp_wait_timeout(Some(-7)), Duration::ZERO);
        assert_eq!(
            config.clamp_wait_timeout(Some(90_000)),
            Duration::from_millis(MAX_WAIT_MS)
        );
    }

    #[test]
    fn test_clamp_max_age_minutes() {
        let config = CountConfig::default();
        assert_eq!(config.clamp_max_age_minutes(None), 60);
        assert_eq!(config.clamp_max_age_minutes(Some(10)), 10);
        assert_eq!(config.clamp_max_age_minutes(Some(0)), 0);
        assert_eq!(config.clamp_max_age_minutes(Some(-1)), 0);
        assert_eq!(
            config.clamp_max_age_minutes(Some(100_000)),
            MAX_AGE_CAP_MINUTES
        );
    }

    #[test]
    fn test_clamp_min_start_interval() {
        let config = CountConfig::default();
        assert_eq!(
            config.clamp_min_start_interval(None),
            Duration::from_millis(60_000)
        );
        assert_eq!(
            config.clamp_min_start_interval(Some(1_000)),
            Duration::from_millis(1_000)
        );
        assert_eq!(
            config.clamp_min_start_interval(Some(10_000_000)),
            Duration::from_millis(MIN_START_INTERVAL_CAP_MS)
        );
    }

    #[test]
    fn test_clamp_caps_oversized_default() {
        // Validation rejects defaults above the caps, but clamping stays safe
        let config = CountConfig {
            default_wait_timeout_ms: MAX_WAIT_MS + 1_000,
            ..CountConfig::default()
        };
        assert_eq!(
            config.clamp_wait_timeout(None),
            Duration::from_millis(MAX_WAIT_MS)
        );
    }
}
