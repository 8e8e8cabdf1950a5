//! Generic keyed cache with write-through persistence
//!
//! One pattern backs the translation, comment, and notification stores: a
//! keyed map persisted to durable storage on every mutation. TTL-bounded
//! caches purge stale entries lazily on load and on read; unbounded stores
//! never evict on their own, growth is the caller's discipline.

use crate::storage::KeyValueStore;
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One cached value with its write time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: DateTime<Utc>,
}

/// Keyed, optionally TTL-bounded cache persisted through a key-value backend.
///
/// Values serialize as JSON under a single storage key per cache instance.
/// Storage failures are absorbed: the cache logs and keeps serving from
/// memory for the rest of the session.
pub struct KeyedCache<V> {
    entries: HashMap<String, CacheEntry<V>>,
    ttl: Option<Duration>,
    backend: Box<dyn KeyValueStore>,
    storage_key: String,
}

impl<V: Serialize + DeserializeOwned + Clone> KeyedCache<V> {
    /// Open a cache under the given storage key, purging any entries that
    /// expired while persisted
    pub fn open(
        storage_key: impl Into<String>,
        ttl: Option<Duration>,
        backend: Box<dyn KeyValueStore>,
    ) -> Self {
        let storage_key = storage_key.into();
        let entries = match backend.get(&storage_key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    log::warn!(
                        "Malformed persisted cache under {}: {}; starting empty",
                        storage_key,
                        e
                    );
                    HashMap::new()
                }
            },
            Ok(None) => HashMap::new(),
            Err(e) => {
                log::warn!("Could not read cache under {}: {}", storage_key, e);
                HashMap::new()
            }
        };

        let mut cache = Self {
            entries,
            ttl,
            backend,
            storage_key,
        };
        cache.evict_expired();
        cache
    }

    /// Fetch a value. Entries past the TTL are never returned; they are
    /// dropped on the spot.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = Utc::now();
        if let Some(entry) = self.entries.get(key) {
            if self.is_expired(entry, now) {
                self.entries.remove(key);
                self.persist();
                return None;
            }
            return Some(self.entries[key].value.clone());
        }
        None
    }

    /// Insert or replace a value, writing through to storage
    pub fn put(&mut self, key: impl Into<String>, value: V) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                created_at: Utc::now(),
            },
        );
        self.persist();
    }

    /// Remove one entry, if present
    pub fn remove(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.persist();
        }
        removed
    }

    /// Drop every entry past the TTL. No-op for unbounded caches.
    pub fn evict_expired(&mut self) {
        if self.ttl.is_none() {
            return;
        }
        let now = Utc::now();
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| !expired(entry.created_at, ttl, now));
        if self.entries.len() != before {
            self.persist();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_expired(&self, entry: &CacheEntry<V>, now: DateTime<Utc>) -> bool {
        expired(entry.created_at, self.ttl, now)
    }

    fn persist(&mut self) {
        let raw = match serde_json::to_string(&self.entries) {
            Ok(raw) => raw,
            Err(e) => {
                log::error!("Failed to serialize cache under {}: {}", self.storage_key, e);
                return;
            }
        };
        if let Err(e) = self.backend.put(&self.storage_key, &raw) {
            log::error!("Failed to persist cache under {}: {}", self.storage_key, e);
        }
    }
}

fn expired(created_at: DateTime<Utc>, ttl: Option<Duration>, now: DateTime<Utc>) -> bool {
    match ttl {
        Some(ttl) => now - created_at > ttl,
        None => false,
    }
}

/// Deterministic composite key from ordered parts, `:`-joined
pub fn composite_key(parts: &[&str]) -> String {
    parts.join(":")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use pretty_assertions::assert_eq;

    fn make_cache(ttl: Option<Duration>) -> KeyedCache<String> {
        KeyedCache::open("test:cache", ttl, Box::new(MemoryStore::new()))
    }

    #[test]
    fn test_put_then_get_returns_stored_value() {
        let mut cache = make_cache(Some(Duration::days(7)));
        cache.put("en:fr:hello", "bonjour".to_string());
        assert_eq!(cache.get("en:fr:hello"), Some("bonjour".to_string()));
    }

    #[test]
    fn test_get_missing_key() {
        let mut cache = make_cache(None);
        assert_eq!(cache.get("nope"), None);
    }

    #[test]
    fn test_expired_entry_is_never_served() {
        let mut cache = make_cache(Some(Duration::days(7)));
        cache.put("stale", "value".to_string());
        // Backdate the write past the TTL
        cache.entries.get_mut("stale").unwrap().created_at = Utc::now() - Duration::days(8);

        assert_eq!(cache.get("stale"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_unbounded_cache_never_expires() {
        let mut cache = make_cache(None);
        cache.put("old", "value".to_string());
        cache.entries.get_mut("old").unwrap().created_at = Utc::now() - Duration::days(365);

        cache.evict_expired();
        assert_eq!(cache.get("old"), Some("value".to_string()));
    }

    #[test]
    fn test_evict_expired_purges_only_stale() {
        let mut cache = make_cache(Some(Duration::days(7)));
        cache.put("stale", "a".to_string());
        cache.put("fresh", "b".to_string());
        cache.entries.get_mut("stale").unwrap().created_at = Utc::now() - Duration::days(10);

        cache.evict_expired();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("fresh"), Some("b".to_string()));
    }

    #[test]
    fn test_remove() {
        let mut cache = make_cache(None);
        cache.put("k", "v".to_string());
        assert!(cache.remove("k"));
        assert!(!cache.remove("k"));
    }

    #[test]
    fn test_expired_entries_purged_on_load() {
        let mut backend = MemoryStore::new();
        let stale = HashMap::from([(
            "old".to_string(),
            CacheEntry {
                value: "v".to_string(),
                created_at: Utc::now() - Duration::days(30),
            },
        )]);
        backend
            .put("test:cache", &serde_json::to_string(&stale).unwrap())
            .unwrap();

        let cache: KeyedCache<String> =
            KeyedCache::open("test:cache", Some(Duration::days(7)), Box::new(backend));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_malformed_persisted_cache_starts_empty() {
        let mut backend = MemoryStore::new();
        backend.put("test:cache", "not json").unwrap();

        let cache: KeyedCache<String> = KeyedCache::open("test:cache", None, Box::new(backend));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_composite_key() {
        assert_eq!(composite_key(&["en", "fr", "hello wo"]), "en:fr:hello wo");
    }
}
