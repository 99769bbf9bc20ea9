//! Cache seam for batch and query-path suggestion results
//!
//! The engine talks to a `CacheStore` trait object so route handlers can hand
//! it a shared cache (Redis-backed, process-local, whatever) and tests can
//! hand it a plain in-memory map. Entries are `serde_json::Value`; the engine
//! owns the typed (de)serialization.
//!
//! `set` deliberately takes no TTL: the store applies its own default expiry
//! and the engine layers logical freshness checks (8-hour batch member
//! expiry, 1-hour query-path `cached_at` windows) on top. A store that cannot
//! serve a key returns `None`, which the engine treats as a miss.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::Value;

/// Default outer-bound expiry for `MemoryCache` entries.
///
/// Longer than any logical freshness window the engine enforces, so the
/// store's own expiry never races the engine's validity checks.
const DEFAULT_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Key-value store with per-entry expiry.
pub trait CacheStore: Send + Sync {
    /// Look up a live entry. Expired or missing keys return `None`.
    fn get(&self, key: &str) -> Option<Value>;

    /// Store a value under the store's default expiry.
    fn set(&self, key: &str, value: Value);

    /// Drop a single entry.
    fn remove(&self, key: &str);

    /// List the keys of all live entries.
    fn keys(&self) -> Vec<String>;

    /// Drop everything.
    fn clear(&self);
}

struct CacheEntry {
    value: Value,
    deadline: Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

/// Process-local `CacheStore` backed by a mutex-guarded map.
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl MemoryCache {
    /// Create a cache with the default 12-hour entry expiry.
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Create a cache with a custom default entry expiry.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Number of live entries (expired entries are not counted).
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().expect("cache lock poisoned");
        entries.values().filter(|e| !e.is_expired()).count()
    }

    /// True when no live entries remain.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        match entries.get(key) {
            Some(entry) if !entry.is_expired() => Some(entry.value.clone()),
            Some(_) => {
                // Lazy eviction on read
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn set(&self, key: &str, value: Value) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                deadline: Instant::now() + self.ttl,
            },
        );
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.remove(key);
    }

    fn keys(&self) -> Vec<String> {
        let entries = self.entries.lock().expect("cache lock poisoned");
        entries
            .iter()
            .filter(|(_, e)| !e.is_expired())
            .map(|(k, _)| k.clone())
            .collect()
    }

    fn clear(&self) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_then_get_returns_value() {
        let cache = MemoryCache::new();
        cache.set("k", json!({"a": 1}));
        assert_eq!(cache.get("k"), Some(json!({"a": 1})));
    }

    #[test]
    fn test_missing_key_returns_none() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("nope"), None);
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = MemoryCache::with_ttl(Duration::from_millis(0));
        cache.set("k", json!(1));
        assert_eq!(cache.get("k"), None);
        // Lazy eviction removed the entry entirely
        assert!(cache.is_empty());
    }

    #[test]
    fn test_remove_drops_entry() {
        let cache = MemoryCache::new();
        cache.set("k", json!(1));
        cache.remove("k");
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_keys_lists_live_entries_only() {
        let cache = MemoryCache::new();
        cache.set("a", json!(1));
        cache.set("b", json!(2));
        let mut keys = cache.keys();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_clear_empties_store() {
        let cache = MemoryCache::new();
        cache.set("a", json!(1));
        cache.set("b", json!(2));
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.keys().is_empty());
    }

    #[test]
    fn test_overwrite_replaces_value() {
        let cache = MemoryCache::new();
        cache.set("k", json!(1));
        cache.set("k", json!(2));
        assert_eq!(cache.get("k"), Some(json!(2)));
    }
}
