//! Cache configuration.

use std::time::Duration;

/// Configuration for a cache instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries in the cache.
    pub max_capacity: u64,

    /// Entries are evicted this long after insertion.
    pub ttl: Option<Duration>,

    /// Entries are evicted if not read within this duration.
    pub tti: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            ttl: Some(Duration::from_secs(300)), // 5 minutes
            tti: None,
        }
    }
}

impl CacheConfig {
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self {
            max_capacity,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn ttl(mut self, duration: Duration) -> Self {
        self.ttl = Some(duration);
        self
    }

    #[must_use]
    pub fn tti(mut self, duration: Duration) -> Self {
        self.tti = Some(duration);
        self
    }

    /// Telegram user records, refreshed on every message anyway.
    pub fn users() -> Self {
        Self::with_capacity(10_000).ttl(Duration::from_secs(3600))
    }

    /// Admin lookups; short lived since promotions happen outside the bot.
    pub fn admins() -> Self {
        Self::with_capacity(10_000)
            .ttl(Duration::from_secs(300))
            .tti(Duration::from_secs(120))
    }

    /// Per-user settings, touched from menus only.
    pub fn settings() -> Self {
        Self::with_capacity(2_000)
            .ttl(Duration::from_secs(600))
            .tti(Duration::from_secs(300))
    }

    /// Group titles seen on incoming messages.
    pub fn groups() -> Self {
        Self::with_capacity(5_000).ttl(Duration::from_secs(1800))
    }
}
