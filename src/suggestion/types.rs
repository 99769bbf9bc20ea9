//! Core suggestion types shared by the batch and query paths
//!
//! Batch results (`OptimizedSuggestion`) carry their own expiry and are
//! cached as one unit per (type, category) pair; a single stale member
//! invalidates the whole batch. Query-path results (`PromptSuggestion`) are
//! lighter and live only inside the one-hour query cache.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::provider::ProviderKind;

/// How long a batch result stays servable.
pub const BATCH_TTL_HOURS: i64 = 8;

/// Content type of a suggestion request, which drives provider selection,
/// batch sizing, and queue priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionType {
    /// Open-ended, imaginative prompts
    Creative,
    /// Step-by-step, well-organized prompts
    Structured,
    /// Rigorous, domain-technical prompts
    Technical,
    /// Prompts tied to what is currently popular
    Trending,
}

impl SuggestionType {
    /// Wire/cache-key name for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionType::Creative => "creative",
            SuggestionType::Structured => "structured",
            SuggestionType::Technical => "technical",
            SuggestionType::Trending => "trending",
        }
    }

    /// How many suggestions one batch of this type requests from a provider.
    pub fn batch_size(&self) -> usize {
        match self {
            SuggestionType::Creative => 15,
            SuggestionType::Structured => 20,
            SuggestionType::Technical => 12,
            SuggestionType::Trending => 10,
        }
    }
}

impl std::fmt::Display for SuggestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Queue priority of a batch request.
///
/// High-priority requests skip the queue and execute immediately, even while
/// another batch is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// Timeframe for trending suggestion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Day,
    #[default]
    Week,
    Month,
}

impl Timeframe {
    /// Cache-key name for this timeframe.
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Day => "day",
            Timeframe::Week => "week",
            Timeframe::Month => "month",
        }
    }

    /// Human phrasing used inside generation prompts.
    pub fn phrase(&self) -> &'static str {
        match self {
            Timeframe::Day => "in the last 24 hours",
            Timeframe::Week => "this week",
            Timeframe::Month => "this month",
        }
    }
}

/// One bulk generation request for a (type, category) pair.
///
/// Created per orchestration call, immutable, discarded after execution.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub id: String,
    pub suggestion_type: SuggestionType,
    pub category: String,
    pub count: usize,
    pub priority: Priority,
    pub timestamp: DateTime<Utc>,
}

impl BatchRequest {
    /// Build a request with the fixed per-type batch size and the priority
    /// policy applied.
    pub fn new(suggestion_type: SuggestionType, category: &str) -> Self {
        let now = Utc::now();
        Self {
            id: format!(
                "batch_{}_{}_{}",
                suggestion_type.as_str(),
                category,
                now.timestamp_millis()
            ),
            suggestion_type,
            category: category.to_string(),
            count: suggestion_type.batch_size(),
            priority: priority_for(suggestion_type, category),
            timestamp: now,
        }
    }
}

/// Priority policy: creative work and the high-traffic categories jump the
/// queue, trending sits in the middle, everything else waits.
pub fn priority_for(suggestion_type: SuggestionType, category: &str) -> Priority {
    let category = category.to_lowercase();
    if suggestion_type == SuggestionType::Creative
        || matches!(category.as_str(), "marketing" | "product" | "general")
    {
        Priority::High
    } else if suggestion_type == SuggestionType::Trending {
        Priority::Medium
    } else {
        Priority::Low
    }
}

/// A batch-path suggestion, cached for eight hours as part of its batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedSuggestion {
    pub id: String,
    pub title: String,
    pub description: String,
    pub prompt: String,
    pub category: String,
    pub tags: Vec<String>,
    /// 1 (simple) to 5 (expert)
    pub complexity: u8,
    pub provider_used: ProviderKind,
    /// Estimated generation cost in USD
    pub estimated_cost: f64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl OptimizedSuggestion {
    /// True while this suggestion may still be served from cache.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Returns the expiry stamp for a suggestion created at `created_at`.
pub fn batch_expiry(created_at: DateTime<Utc>) -> DateTime<Utc> {
    created_at + Duration::hours(BATCH_TTL_HOURS)
}

/// A cached batch is usable only while every member is still live.
pub fn is_batch_valid(batch: &[OptimizedSuggestion], now: DateTime<Utc>) -> bool {
    !batch.is_empty() && batch.iter().all(|s| s.is_live(now))
}

/// A query-path suggestion: personalized or trending, relevance-ranked,
/// cached for at most one hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptSuggestion {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub prompt: String,
    pub tags: Vec<String>,
    /// Heuristic fit to the query and user context, in [0, 1]
    pub relevance_score: f64,
    pub estimated_tokens: u32,
}
