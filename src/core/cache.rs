//! The local cache store: the single source of truth for foreground reads.

use dashmap::DashMap;
use std::collections::HashMap;

/// Why a cache write happened.
///
/// The write reason drives the side effects of a write: only `Reload`
/// dispatches change notifications, and only `Initial` nudges the refresh
/// daemon to start tracking a key early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteReason {
    /// First-ever lookup of a key from the foreground path.
    Initial,
    /// The refresh daemon observed a changed value at the admin source.
    Reload,
    /// Bootstrap population from mirror and remote data. Silent.
    Preload,
}

/// A single cached value.
///
/// The *presence* of an entry in the store means "this process holds an
/// authoritative-as-of-last-sync answer for this key". `value() == None` is
/// that answer for a key the admin source does not have — a negative cache
/// hit, which keeps repeated lookups of a nonexistent key off the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    value: Option<String>,
}

impl CacheEntry {
    pub(crate) fn new(value: Option<String>) -> Self {
        Self { value }
    }

    /// The cached value, or `None` for a cached miss.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

/// Concurrent key→entry map.
///
/// Entries are replaced atomically and never mutated in place, so readers
/// never observe a torn value. Writes to different keys land on different
/// shards and do not contend; writes to the same key are last-writer-wins.
/// The store never contacts the remote source — that is the sync engine's
/// job.
pub struct CacheStore {
    entries: DashMap<String, CacheEntry>,
}

impl CacheStore {
    pub(crate) fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Look up a key. Returns a clone of the entry so no shard lock is held
    /// by the caller.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Insert or replace an entry, returning the prior entry if any.
    pub(crate) fn insert(&self, key: String, entry: CacheEntry) -> Option<CacheEntry> {
        self.entries.insert(key, entry)
    }

    /// True when no key has ever been requested.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The full tracked key set.
    pub(crate) fn tracked_keys(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }

    /// Current values for `keys`, in mirror form: cached misses flatten to
    /// the empty string so the snapshot covers every tracked key.
    pub(crate) fn snapshot(&self, keys: &[String]) -> HashMap<String, String> {
        keys.iter()
            .filter_map(|key| {
                self.get(key)
                    .map(|entry| (key.clone(), entry.value().unwrap_or_default().to_owned()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let store = CacheStore::new();
        assert!(store.is_empty());

        store.insert("db.url".into(), CacheEntry::new(Some("postgres://x".into())));
        let entry = store.get("db.url").unwrap();
        assert_eq!(entry.value(), Some("postgres://x"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_absent_key_is_not_an_entry() {
        let store = CacheStore::new();
        assert!(store.get("never.requested").is_none());
    }

    #[test]
    fn test_negative_entry_is_present() {
        let store = CacheStore::new();
        store.insert("missing.key".into(), CacheEntry::new(None));

        // The entry exists (the key is known), but carries no value.
        let entry = store.get("missing.key").unwrap();
        assert_eq!(entry.value(), None);
        assert!(!store.is_empty());
    }

    #[test]
    fn test_insert_returns_prior() {
        let store = CacheStore::new();
        assert!(store
            .insert("k".into(), CacheEntry::new(Some("v1".into())))
            .is_none());

        let prior = store
            .insert("k".into(), CacheEntry::new(Some("v2".into())))
            .unwrap();
        assert_eq!(prior.value(), Some("v1"));
        assert_eq!(store.get("k").unwrap().value(), Some("v2"));
    }

    #[test]
    fn test_snapshot_flattens_misses() {
        let store = CacheStore::new();
        store.insert("a".into(), CacheEntry::new(Some("1".into())));
        store.insert("b".into(), CacheEntry::new(None));
        store.insert("c".into(), CacheEntry::new(Some(String::new())));

        let keys = store.tracked_keys();
        let snap = store.snapshot(&keys);
        assert_eq!(snap.len(), 3);
        assert_eq!(snap["a"], "1");
        assert_eq!(snap["b"], "");
        assert_eq!(snap["c"], "");
    }
}
