// Cache entry with creation and expiry timestamps.
// Holds the single freshness predicate used by both lazy expiry and pruning.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default TTL for cached responses: 60 seconds.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// A cached response payload with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cached payload.
    pub data: Value,
    /// When the entry was inserted.
    pub created_at: DateTime<Utc>,
    /// When the entry stops being fresh.
    pub expires: DateTime<Utc>,
}

impl CacheEntry {
    /// Create an entry inserted at `now` that lives for `ttl`.
    pub fn new(data: Value, now: DateTime<Utc>, ttl: Duration) -> Self {
        let delta = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        let expires = now
            .checked_add_signed(delta)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            data,
            created_at: now,
            expires,
        }
    }

    /// Fresh iff `now` is strictly before the expiry timestamp.
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires
    }

    /// Time since insertion.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.created_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Time left before expiry, zero once stale.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        self.expires
            .signed_duration_since(now)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub(crate) fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
