//! Per-identity issuance quota over a fixed window.
//!
//! The counter lives in an injectable [`CounterStore`] so single-instance
//! deployments can use the in-process [`MemoryCounterStore`] while
//! multi-instance deployments back it with a distributed counter. Counters
//! are ephemeral cache state: entries expire with the window and are dropped
//! lazily at the next access, never swept.
//!
//! Check-then-record is not atomic across concurrent requests for the same
//! identity, so the counter may momentarily exceed the configured maximum by
//! the number of in-flight requests. This is an accepted soft limit.

use crate::Error;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    /// Over quota for the current window. `retry_after` is the full window
    /// length, suitable for a "try again in N minutes" hint.
    Throttled { retry_after: Duration },
}

impl RateLimitDecision {
    pub fn is_throttled(&self) -> bool {
        matches!(self, RateLimitDecision::Throttled { .. })
    }
}

/// Counting store backing the rate limiter.
#[async_trait]
pub trait CounterStore: Send + Sync + 'static {
    /// Current count for a key, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<u32>, Error>;

    /// Increment the counter, setting or refreshing its expiry to
    /// now + `window`. Returns the new count.
    async fn increment(&self, key: &str, window: Duration) -> Result<u32, Error>;
}

#[derive(Debug, Clone)]
struct CounterEntry {
    count: u32,
    expires_at: DateTime<Utc>,
}

/// In-process counter store for single-instance deployments.
#[derive(Default)]
pub struct MemoryCounterStore {
    entries: DashMap<String, CounterEntry>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn get(&self, key: &str) -> Result<Option<u32>, Error> {
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > Utc::now() {
                return Ok(Some(entry.count));
            }
        }
        // Expired entries are removed on the access that observes them.
        self.entries
            .remove_if(key, |_, entry| entry.expires_at <= Utc::now());
        Ok(None)
    }

    async fn increment(&self, key: &str, window: Duration) -> Result<u32, Error> {
        let now = Utc::now();
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert(CounterEntry {
                count: 0,
                expires_at: now + window,
            });
        if entry.expires_at <= now {
            entry.count = 0;
        }
        entry.count += 1;
        entry.expires_at = now + window;
        Ok(entry.count)
    }
}

/// Issuance quota keyed by normalized email address.
pub struct RateLimiter<C: CounterStore> {
    store: std::sync::Arc<C>,
    max_requests: u32,
    window: Duration,
}

impl<C: CounterStore> RateLimiter<C> {
    pub fn new(store: std::sync::Arc<C>, max_requests: u32, window: Duration) -> Self {
        Self {
            store,
            max_requests,
            window,
        }
    }

    /// Check the quota without mutating it. Over-quota requests are rejected
    /// until the window expires.
    pub async fn check(&self, email: &str) -> Result<RateLimitDecision, Error> {
        let key = cache_key(email);
        let count = self.store.get(&key).await?.unwrap_or(0);
        if count >= self.max_requests {
            return Ok(RateLimitDecision::Throttled {
                retry_after: self.window,
            });
        }
        Ok(RateLimitDecision::Allowed)
    }

    /// Count one issuance against the quota, refreshing the window expiry.
    ///
    /// Called only once the account is known eligible, so requests for
    /// unknown or unconfirmed emails never consume quota. The quota protects
    /// real accounts from mail spam; it is not a probe limiter.
    pub async fn record(&self, email: &str) -> Result<u32, Error> {
        self.store.increment(&cache_key(email), self.window).await
    }
}

/// Case-folds the email so casing variations cannot bypass the limit.
fn cache_key(email: &str) -> String {
    format!("magiclink:request:{}", email.to_lowercase())
}
