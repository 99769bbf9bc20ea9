//! Per-user interaction history
//!
//! Interactions are the sole input to personalization; there is no separate
//! profile store. Each user's history lives in the shared cache as a capped
//! list (max 50, newest first), so it ages out with the cache like everything
//! else in this engine.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::CacheStore;

/// Cap on retained interactions per user.
pub const MAX_HISTORY: usize = 50;

/// Context the caller captured alongside an interaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionContext {
    #[serde(default)]
    pub previous_queries: Vec<String>,
    #[serde(default)]
    pub user_preferences: Vec<String>,
    #[serde(default)]
    pub session_data: Value,
}

/// One recorded user interaction with the suggestion system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInteraction {
    pub user_id: String,
    pub query: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub selected_suggestion_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub context: InteractionContext,
}

/// Cache-backed capped interaction log.
pub struct InteractionLog {
    cache: Arc<dyn CacheStore>,
    // Serializes the fetch-prepend-set sequence in record()
    write_lock: Mutex<()>,
}

impl InteractionLog {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self {
            cache,
            write_lock: Mutex::new(()),
        }
    }

    fn cache_key(user_id: &str) -> String {
        format!("interactions:{user_id}")
    }

    /// Prepend an interaction to its user's history, dropping the oldest
    /// entries past the cap.
    pub fn record(&self, interaction: UserInteraction) {
        let _guard = self.write_lock.lock().expect("history lock poisoned");
        let key = Self::cache_key(&interaction.user_id);
        let mut history = self.fetch(&interaction.user_id);
        history.insert(0, interaction);
        history.truncate(MAX_HISTORY);

        match serde_json::to_value(&history) {
            Ok(value) => self.cache.set(&key, value),
            Err(e) => log::warn!("Failed to serialize interaction history: {}", e),
        }
    }

    /// A user's retained history, newest first. Missing or unreadable cache
    /// entries yield an empty history.
    pub fn fetch(&self, user_id: &str) -> Vec<UserInteraction> {
        self.cache
            .get(&Self::cache_key(user_id))
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;

    fn interaction(user_id: &str, query: &str) -> UserInteraction {
        UserInteraction {
            user_id: user_id.to_string(),
            query: query.to_string(),
            category: None,
            selected_suggestion_id: None,
            timestamp: Utc::now(),
            context: InteractionContext::default(),
        }
    }

    fn log() -> InteractionLog {
        InteractionLog::new(Arc::new(MemoryCache::new()))
    }

    #[test]
    fn test_fetch_unknown_user_is_empty() {
        assert!(log().fetch("ghost").is_empty());
    }

    #[test]
    fn test_record_prepends_newest_first() {
        let log = log();
        log.record(interaction("u1", "first"));
        log.record(interaction("u1", "second"));

        let history = log.fetch("u1");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].query, "second");
        assert_eq!(history[1].query, "first");
    }

    #[test]
    fn test_history_capped_at_fifty() {
        let log = log();
        for i in 0..60 {
            log.record(interaction("u1", &format!("query {i}")));
        }

        let history = log.fetch("u1");
        assert_eq!(history.len(), MAX_HISTORY);
        // Newest survives, oldest ten were dropped
        assert_eq!(history[0].query, "query 59");
        assert_eq!(history[MAX_HISTORY - 1].query, "query 10");
    }

    #[test]
    fn test_users_do_not_share_history() {
        let log = log();
        log.record(interaction("u1", "alpha"));
        log.record(interaction("u2", "beta"));

        assert_eq!(log.fetch("u1").len(), 1);
        assert_eq!(log.fetch("u2").len(), 1);
        assert_eq!(log.fetch("u1")[0].query, "alpha");
    }

    #[test]
    fn test_concurrent_records_are_all_retained() {
        let log = Arc::new(log());

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let log = Arc::clone(&log);
                std::thread::spawn(move || {
                    for i in 0..10 {
                        log.record(interaction("u1", &format!("thread {t} query {i}")));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // 40 writes under the 50 cap: none may be lost to a racing writer
        assert_eq!(log.fetch("u1").len(), 40);
    }

    #[test]
    fn test_corrupt_cache_entry_degrades_to_empty() {
        let cache = Arc::new(MemoryCache::new());
        cache.set("interactions:u1", serde_json::json!("not a list"));
        let log = InteractionLog::new(cache);
        assert!(log.fetch("u1").is_empty());
    }
}
