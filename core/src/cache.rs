//! Memoized on-demand query outcomes
//!
//! Keys are raw URL query strings, byte-for-byte as received, so identical
//! requests within the TTL share one probe evaluation. Expiry is anchored
//! on the outcome's own timestamp. Concurrent miss-then-store races are
//! accepted: query evaluations are idempotent and the last writer wins.

use crate::outcome::Outcome;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// TTL cache of query-string keyed outcomes
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: Mutex<HashMap<String, Outcome>>,
}

impl QueryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached outcome for `key` if it is younger than `ttl`
    pub fn lookup(&self, key: &str, ttl: Duration) -> Option<Outcome> {
        let entries = self.entries.lock().expect("query cache poisoned");
        entries
            .get(key)
            .filter(|outcome| outcome.timestamp.elapsed() <= ttl)
            .cloned()
    }

    /// Insert or replace the outcome for `key`
    pub fn store(&self, key: &str, outcome: Outcome) {
        let mut entries = self.entries.lock().expect("query cache poisoned");
        entries.insert(key.to_string(), outcome);
    }

    /// Drop every entry older than `ttl`, returning how many were removed
    pub fn sweep(&self, ttl: Duration) -> usize {
        let mut entries = self.entries.lock().expect("query cache poisoned");
        let before = entries.len();
        entries.retain(|_, outcome| outcome.timestamp.elapsed() <= ttl);
        before - entries.len()
    }

    /// Number of live entries, expired or not
    pub fn len(&self) -> usize {
        self.entries.lock().expect("query cache poisoned").len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
