//! Time-windowed response cache.
//!
//! Entries expire a fixed TTL after insertion. Expired entries are dropped
//! lazily on lookup and eagerly by [`ResponseCache::sweep`]. Time comes from an
//! injected [`Clock`] so expiry is testable.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use crate::config::StrategyKind;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(start) }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Which search a cached response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDomain {
    Videos,
    Authors,
}

impl SearchDomain {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchDomain::Videos => "videos",
            SearchDomain::Authors => "authors",
        }
    }
}

/// Cache key: domain, strategy and limit plus the effective query text.
///
/// The effective query is keyed verbatim. It alone decides both the
/// retrieval patterns and the scores, so two queries that merely normalize
/// alike must not share an entry.
pub fn cache_key(domain: SearchDomain, strategy: StrategyKind, limit: usize, effective_query: &str) -> String {
    format!("{}:{}:{}:{}", domain.as_str(), strategy.as_str(), limit, effective_query)
}

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    inserted_at: DateTime<Utc>,
}

pub struct ResponseCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(ttl: std::time::Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::days(36_500)),
            clock,
        }
    }

    fn is_fresh(&self, entry: &CacheEntry<V>, now: DateTime<Utc>) -> bool {
        now - entry.inserted_at < self.ttl
    }

    /// Fresh value for `key`, removing it if it has expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let entry = entries.get(key)?;
        if self.is_fresh(entry, now) {
            return Some(entry.value.clone());
        }
        entries.remove(key);
        None
    }

    pub fn insert(&self, key: String, value: V) {
        let inserted_at = self.clock.now();
        self.entries.lock().insert(key, CacheEntry { value, inserted_at });
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| now - entry.inserted_at < self.ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
