use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Expiring key-value cache for proxied responses.
///
/// The clock is passed in by the caller, so expiry is deterministic in tests.
/// Entries live in process memory only; a restart starts cold.
#[derive(Debug, Default)]
pub struct TtlCache<V> {
    entries: BTreeMap<String, Entry<V>>,
}

#[derive(Debug)]
struct Entry<V> {
    expires_at: Instant,
    value: V,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Returns the cached value if it has not expired at `now`.
    pub fn get(&self, key: &str, now: Instant) -> Option<V> {
        self.entries
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.clone())
    }

    /// Stores a value valid for `ttl` from `now`, evicting anything already
    /// expired while it is here.
    pub fn put(&mut self, key: impl Into<String>, value: V, ttl: Duration, now: Instant) {
        self.entries.retain(|_, entry| entry.expires_at > now);
        self.entries.insert(
            key.into(),
            Entry {
                expires_at: now + ttl,
                value,
            },
        );
    }
}
