//! Key -> value store with lazy per-entry expiration.

use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    /// `None` when the ttl reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// Outcome of a cache read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup<V> {
    Hit(V),
    /// An entry existed but had expired; it has been removed.
    Expired,
    Miss,
}

/// TTL cache. Entries are never swept; expiry is checked on the next read of that key.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: HashMap<String, CacheEntry<V>>,
}

impl<V> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Store `value` for `ttl`, overwriting any prior entry. A zero ttl stores nothing;
    /// a ttl too large to represent never expires.
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        let expires_at = Instant::now().checked_add(ttl);
        self.entries
            .insert(key.into(), CacheEntry { value, expires_at });
    }

    /// Entry count, including expired entries that have not been read since expiring.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<V: Clone> TtlCache<V> {
    pub fn lookup(&mut self, key: &str) -> CacheLookup<V> {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if entry.is_live(now) => return CacheLookup::Hit(entry.value.clone()),
            Some(_) => {}
            None => return CacheLookup::Miss,
        }
        self.entries.remove(key);
        CacheLookup::Expired
    }

    pub fn get(&mut self, key: &str) -> Option<V> {
        match self.lookup(key) {
            CacheLookup::Hit(v) => Some(v),
            _ => None,
        }
    }
}
