//! Suggestion engine orchestration
//!
//! `SuggestionEngine` composes the quota enforcer, cache, provider pair, and
//! generators behind the caller-facing operations. Batch requests are
//! quota-gated and cached eight hours per (type, category); query-path
//! results (ad hoc, trending, personalized) are cached one hour behind a
//! `cached_at` freshness wrapper.
//!
//! Concurrency model: one `tokio::sync::Mutex` serializes non-high-priority
//! batch executions. Callers that find an execution in flight register as
//! queued and await the lock, so every queued caller receives its own real
//! result. High-priority requests bypass the lock entirely and may overlap
//! with a draining queue. A fixed spacing delay is held before the lock is
//! released while further waiters exist, to respect upstream rate limits.
//! There is no cancellation or deadline on provider calls; a hung call
//! blocks its own caller (and the queue behind it) but not the
//! high-priority path.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Duration as TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::CacheStore;
use crate::config::{Config, EngineSettings};
use crate::error::EngineError;
use crate::generator;
use crate::history::{InteractionLog, UserInteraction};
use crate::personalization::{self, MIN_HISTORY_FOR_PERSONALIZATION};
use crate::provider::{AiError, ProviderSet};
use crate::quota::{QuotaEnforcer, SessionLimits, Tier};
use crate::scoring::{self, ScoringContext};
use crate::suggestion::types::{
    BatchRequest, OptimizedSuggestion, Priority, PromptSuggestion, SuggestionType, Timeframe,
    is_batch_valid,
};

/// Freshness window for query-path cache entries.
const QUERY_CACHE_MINUTES: i64 = 60;

/// Snapshot of the batch queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStatus {
    /// Callers currently waiting for the batch lock
    pub queued: usize,
    /// Whether a locked batch execution is in flight
    pub processing: bool,
}

/// Query-path cache entry carrying its own creation stamp, since the cache
/// interface takes no TTL.
#[derive(Serialize, Deserialize)]
struct TimedEntry {
    cached_at: DateTime<Utc>,
    suggestions: Vec<PromptSuggestion>,
}

impl TimedEntry {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now - self.cached_at < TimeDelta::minutes(QUERY_CACHE_MINUTES)
    }
}

/// The suggestion batching, caching, and quota engine.
pub struct SuggestionEngine {
    providers: ProviderSet,
    cache: Arc<dyn CacheStore>,
    quota: QuotaEnforcer,
    interactions: InteractionLog,
    batch_lock: tokio::sync::Mutex<()>,
    queued: AtomicUsize,
    processing: AtomicBool,
    batch_spacing: Duration,
}

impl SuggestionEngine {
    /// Build an engine around an injected provider pair and cache.
    pub fn new(providers: ProviderSet, cache: Arc<dyn CacheStore>) -> Self {
        Self::with_settings(providers, cache, &EngineSettings::default())
    }

    /// Build an engine with explicit tuning knobs.
    pub fn with_settings(
        providers: ProviderSet,
        cache: Arc<dyn CacheStore>,
        settings: &EngineSettings,
    ) -> Self {
        Self {
            providers,
            interactions: InteractionLog::new(Arc::clone(&cache)),
            cache,
            quota: QuotaEnforcer::new(),
            batch_lock: tokio::sync::Mutex::new(()),
            queued: AtomicUsize::new(0),
            processing: AtomicBool::new(false),
            batch_spacing: Duration::from_millis(settings.batch_spacing_ms),
        }
    }

    /// Build an engine with real providers from configuration and a
    /// process-local cache.
    pub fn from_config(config: &Config) -> Result<Self, AiError> {
        let providers = ProviderSet::from_config(config)?;
        Ok(Self::with_settings(
            providers,
            Arc::new(crate::cache::MemoryCache::new()),
            &config.engine,
        ))
    }

    // =====================================================================
    // Batch path
    // =====================================================================

    /// Produce a batch of suggestions for a (type, category) pair.
    ///
    /// Quota is checked first when a user is given; a valid cached batch is
    /// served without any provider call; otherwise the batch is generated,
    /// cached, and the user's token usage recorded. Generation itself never
    /// fails; the only error out of this path is quota rejection.
    pub async fn process_batch_request(
        &self,
        suggestion_type: SuggestionType,
        category: &str,
        user_id: Option<&str>,
    ) -> Result<Vec<OptimizedSuggestion>, EngineError> {
        if let Some(user) = user_id {
            self.quota.check(user)?;
        }

        let key = batch_cache_key(suggestion_type, category);
        if let Some(batch) = self.cached_batch(&key) {
            log::debug!("Batch cache hit for {key}");
            return Ok(batch);
        }

        let request = BatchRequest::new(suggestion_type, category);

        // High priority skips the queue entirely, even while it drains
        if request.priority == Priority::High {
            return Ok(self.execute_batch(&request, &key, user_id).await);
        }

        let guard = match self.batch_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                // An execution is in flight; wait our turn
                self.queued.fetch_add(1, Ordering::SeqCst);
                let guard = self.batch_lock.lock().await;
                self.queued.fetch_sub(1, Ordering::SeqCst);
                guard
            }
        };

        // An earlier holder may have filled the cache while we waited
        if let Some(batch) = self.cached_batch(&key) {
            log::debug!("Batch cache filled while queued for {key}");
            return Ok(batch);
        }

        self.processing.store(true, Ordering::SeqCst);
        let batch = self.execute_batch(&request, &key, user_id).await;
        if self.queued.load(Ordering::SeqCst) > 0 && !self.batch_spacing.is_zero() {
            tokio::time::sleep(self.batch_spacing).await;
        }
        self.processing.store(false, Ordering::SeqCst);
        drop(guard);

        Ok(batch)
    }

    async fn execute_batch(
        &self,
        request: &BatchRequest,
        key: &str,
        user_id: Option<&str>,
    ) -> Vec<OptimizedSuggestion> {
        let provider = self.providers.for_type(request.suggestion_type);
        let batch = generator::generate_batch(request, provider).await;

        match serde_json::to_value(&batch) {
            Ok(value) => self.cache.set(key, value),
            Err(e) => log::warn!("Failed to serialize batch for caching: {e}"),
        }

        if let Some(user) = user_id {
            self.quota.record_usage(user, generator::batch_tokens(&batch));
        }

        batch
    }

    fn cached_batch(&self, key: &str) -> Option<Vec<OptimizedSuggestion>> {
        let value = self.cache.get(key)?;
        let batch: Vec<OptimizedSuggestion> = serde_json::from_value(value).ok()?;
        // One stale member invalidates the whole batch
        is_batch_valid(&batch, Utc::now()).then_some(batch)
    }

    // =====================================================================
    // Query path
    // =====================================================================

    /// Generate relevance-ranked suggestions for one user query.
    pub async fn generate_suggestions(
        &self,
        query: &str,
        user_id: &str,
        context: Option<ScoringContext>,
    ) -> Vec<PromptSuggestion> {
        let key = format!("suggestions:{}:{}", query.trim().to_lowercase(), user_id);
        if let Some(cached) = self.fresh_entry(&key) {
            log::debug!("Query cache hit for {key}");
            return cached;
        }

        let context = context.unwrap_or_default();
        let candidates = generator::generate_query(query, self.providers.creative()).await;
        let ranked = scoring::rank(candidates, query, &context);

        self.store_entry(&key, &ranked);
        ranked
    }

    /// Trending suggestions for a timeframe.
    ///
    /// Returns an empty list on provider or parse failure; failures are not
    /// cached, so the next call retries.
    pub async fn get_trending_suggestions(&self, timeframe: Timeframe) -> Vec<PromptSuggestion> {
        let key = format!("trending:{}", timeframe.as_str());
        if let Some(cached) = self.fresh_entry(&key) {
            return cached;
        }

        match generator::generate_trending(timeframe, self.providers.creative()).await {
            Ok(suggestions) => {
                self.store_entry(&key, &suggestions);
                suggestions
            }
            Err(e) => {
                log::warn!("Trending generation failed: {e}");
                Vec::new()
            }
        }
    }

    /// Personalized suggestions derived from a user's interaction history.
    ///
    /// Requires at least three recorded interactions; below that threshold
    /// trending suggestions are served instead.
    pub async fn get_personalized_suggestions(
        &self,
        user_id: &str,
        category: Option<&str>,
    ) -> Vec<PromptSuggestion> {
        let history = self.interactions.fetch(user_id);
        if history.len() < MIN_HISTORY_FOR_PERSONALIZATION {
            log::debug!(
                "User '{user_id}' has {} interactions, serving trending instead",
                history.len()
            );
            return self.get_trending_suggestions(Timeframe::default()).await;
        }

        let key = format!("personalized:{}:{}", user_id, category.unwrap_or("all"));
        if let Some(cached) = self.fresh_entry(&key) {
            return cached;
        }

        let signals = personalization::derive_signals(&history);
        match generator::generate_personalized(&signals, category, self.providers.creative()).await
        {
            Ok(suggestions) => {
                self.store_entry(&key, &suggestions);
                suggestions
            }
            Err(e) => {
                log::warn!("Personalized generation failed for '{user_id}': {e}");
                Vec::new()
            }
        }
    }

    // =====================================================================
    // State operations
    // =====================================================================

    /// Append an interaction to its user's capped history.
    pub fn record_interaction(&self, interaction: UserInteraction) {
        self.interactions.record(interaction);
    }

    /// Move a user to a new quota tier, keeping their counters.
    pub fn update_user_limits(&self, user_id: &str, tier: Tier) {
        self.quota.set_tier(user_id, tier);
    }

    /// Snapshot of a user's quota counters and limits.
    pub fn get_session_stats(&self, user_id: &str) -> Option<SessionLimits> {
        self.quota.session_stats(user_id)
    }

    /// Snapshot of the batch queue.
    pub fn get_batch_queue_status(&self) -> QueueStatus {
        QueueStatus {
            queued: self.queued.load(Ordering::SeqCst),
            processing: self.processing.load(Ordering::SeqCst),
        }
    }

    /// Evict cached batches with any expired member. Returns how many
    /// batches were cleared.
    pub fn clear_expired_batches(&self) -> usize {
        let now = Utc::now();
        let mut cleared = 0;
        for key in self.cache.keys() {
            if !key.starts_with("batch:") {
                continue;
            }
            let valid = self
                .cache
                .get(&key)
                .and_then(|v| serde_json::from_value::<Vec<OptimizedSuggestion>>(v).ok())
                .is_some_and(|batch| is_batch_valid(&batch, now));
            if !valid {
                self.cache.remove(&key);
                cleared += 1;
            }
        }
        if cleared > 0 {
            log::debug!("Cleared {cleared} expired batches");
        }
        cleared
    }

    // =====================================================================
    // Query-cache plumbing
    // =====================================================================

    fn fresh_entry(&self, key: &str) -> Option<Vec<PromptSuggestion>> {
        let value = self.cache.get(key)?;
        let entry: TimedEntry = serde_json::from_value(value).ok()?;
        entry.is_fresh(Utc::now()).then_some(entry.suggestions)
    }

    fn store_entry(&self, key: &str, suggestions: &[PromptSuggestion]) {
        let entry = TimedEntry {
            cached_at: Utc::now(),
            suggestions: suggestions.to_vec(),
        };
        match serde_json::to_value(&entry) {
            Ok(value) => self.cache.set(key, value),
            Err(e) => log::warn!("Failed to serialize cache entry: {e}"),
        }
    }
}

fn batch_cache_key(suggestion_type: SuggestionType, category: &str) -> String {
    format!("batch:{}:{}", suggestion_type.as_str(), category)
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod engine_tests;
