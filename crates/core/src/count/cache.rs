//! In-process cache of the last completed exact count.

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// A completed count pinned to its completion timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedCount {
    pub exact_orders: u64,
    pub completed_at: DateTime<Utc>,
}

impl CachedCount {
    /// Age in minutes relative to `now`.
    pub fn age_minutes(&self, now: DateTime<Utc>) -> f64 {
        (now - self.completed_at).num_milliseconds() as f64 / 60_000.0
    }
}

/// Single-slot cache holding the most recent completed count.
///
/// Best-effort only: the slot is process-local and vanishes on restart.
/// Freshness is judged per request against the caller's horizon, so one
/// request's stale is another's hit.
#[derive(Debug, Default)]
pub struct CountCache {
    slot: RwLock<Option<CachedCount>>,
}

impl CountCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed count, replacing whatever was cached before.
    pub async fn put(&self, exact_orders: u64, completed_at: DateTime<Utc>) {
        let mut slot = self.slot.write().await;
        *slot = Some(CachedCount {
            exact_orders,
            completed_at,
        });
    }

    /// The cached count if it is within `max_age_minutes` of `now`.
    pub async fn fresh(&self, max_age_minutes: u32, now: DateTime<Utc>) -> Option<CachedCount> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|cached| cached.age_minutes(now) <= max_age_minutes as f64)
            .cloned()
    }

    /// The cached count regardless of age.
    pub async fn peek(&self) -> Option<CachedCount> {
        self.slot.read().await.clone()
    }
}
