//! Thread-safe registry of named check outcomes
//!
//! One entry per configured check, pre-populated with the sentinel outcome
//! at startup. Check runners replace entries wholesale; the aggregator
//! takes point-in-time snapshots. There are no cross-entry invariants, so a
//! single `RwLock` around the map is sufficient: each stored outcome is
//! cloned out as a complete unit and can never be observed torn.

use crate::outcome::Outcome;
use std::collections::{BTreeMap, HashSet};
use std::sync::RwLock;

/// Registry of the latest outcome per configured check
#[derive(Debug)]
pub struct ResultStore {
    entries: RwLock<BTreeMap<String, Outcome>>,
    sentinel: Outcome,
}

impl ResultStore {
    /// Create a store holding the sentinel outcome for every given name
    ///
    /// The key set is fixed for the life of the process.
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        let sentinel = Outcome::initial();
        let entries = names
            .into_iter()
            .map(|name| (name, sentinel.clone()))
            .collect();
        Self {
            entries: RwLock::new(entries),
            sentinel,
        }
    }

    /// Replace the outcome recorded under `name`
    pub fn update(&self, name: &str, outcome: Outcome) {
        let mut entries = self.entries.write().expect("result store poisoned");
        entries.insert(name.to_string(), outcome);
    }

    /// Current outcome for `name`; unknown names read as the sentinel
    pub fn get(&self, name: &str) -> Outcome {
        let entries = self.entries.read().expect("result store poisoned");
        entries.get(name).cloned().unwrap_or_else(|| self.sentinel.clone())
    }

    /// Point-in-time view of every entry whose name is not excluded
    ///
    /// The snapshot is taken under one read lock, so it is a consistent cut
    /// across all entries; callers rely only on the weaker per-entry
    /// guarantee.
    pub fn snapshot(&self, exclude: &HashSet<String>) -> BTreeMap<String, Outcome> {
        let entries = self.entries.read().expect("result store poisoned");
        entries
            .iter()
            .filter(|(name, _)| !exclude.contains(*name))
            .map(|(name, outcome)| (name.clone(), outcome.clone()))
            .collect()
    }

    /// Names of all configured checks
    pub fn names(&self) -> Vec<String> {
        let entries = self.entries.read().expect("result store poisoned");
        entries.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Status;
    use std::sync::Arc;

    fn store(names: &[&str]) -> ResultStore {
        ResultStore::new(names.iter().map(|n| n.to_string()))
    }

    #[test]
    fn starts_with_sentinels() {
        let store = store(&["c1", "c2"]);
        assert!(store.get("c1").is_ok());
        assert!(store.get("c2").message.is_empty());
        assert_eq!(store.names(), vec!["c1", "c2"]);
    }

    #[test]
    fn unknown_name_reads_as_sentinel() {
        let store = store(&["c1"]);
        let outcome = store.get("nope");
        assert!(outcome.is_ok());
        assert!(outcome.message.is_empty());
    }

    #[test]
    fn update_replaces_wholesale() {
        let store = store(&["c1"]);
        store.update("c1", Outcome::error("c1 error: boom"));
        let outcome = store.get("c1");
        assert_eq!(outcome.status, Status::Error);
        assert_eq!(outcome.message, "c1 error: boom");

        store.update("c1", Outcome::ok(""));
        assert!(store.get("c1").is_ok());
    }

    #[test]
    fn snapshot_honors_exclusions() {
        let store = store(&["c1", "c2", "c3"]);
        store.update("c2", Outcome::error("c2 error: down"));

        let exclude: HashSet<String> = ["c2".to_string()].into();
        let snap = store.snapshot(&exclude);
        assert_eq!(snap.len(), 2);
        assert!(!snap.contains_key("c2"));
        assert!(snap.values().all(Outcome::is_ok));

        let full = store.snapshot(&HashSet::new());
        assert_eq!(full.len(), 3);
        assert!(!full["c2"].is_ok());
    }

    #[test]
    fn concurrent_writers_do_not_tear_entries() {
        let store = Arc::new(store(&["c1"]));
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                for _ in 0..200 {
                    store.update("c1", Outcome::ok(format!("writer-{i}")));
                    let seen = store.get("c1");
                    // A complete entry: message always matches some writer.
                    assert!(seen.message.starts_with("writer-"));
                }
            }));
        }
        for handle in handles {
            handle.join().expect("writer panicked");
        }
    }
}
