//! Cache sizing and expiry.

use std::time::Duration;

/// Capacity and expiry of one cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub max_capacity: u64,
    /// Entries are dropped this long after being written.
    pub ttl: Duration,
    /// Entries are dropped when not read for this long.
    pub tti: Option<Duration>,
}

impl CacheConfig {
    pub const fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            max_capacity,
            ttl,
            tti: None,
        }
    }

    #[must_use]
    pub const fn idle_for(mut self, tti: Duration) -> Self {
        self.tti = Some(tti);
        self
    }

    /// Chat policies, read on every message.
    /// Writes refresh the cache, so entries can live long.
    pub const fn policy() -> Self {
        Self::new(10_000, Duration::from_secs(600))
    }

    /// Member roles. Short lived so promotions and demotions show up quickly.
    pub const fn roles() -> Self {
        Self::new(10_000, Duration::from_secs(300)).idle_for(Duration::from_secs(120))
    }
}
