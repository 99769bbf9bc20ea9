//! promptdeck - LLM suggestion batching, caching, and quota engine
//!
//! Batches prompt suggestions per (type, category), serves them from a
//! pluggable cache, ranks query results by relevance, personalizes from
//! interaction history, and enforces per-user quota tiers.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod history;
pub mod personalization;
pub mod provider;
pub mod quota;
pub mod scoring;
pub mod suggestion;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types for convenience
pub use cache::{CacheStore, MemoryCache};
pub use config::{Config, load_config};
pub use engine::{QueueStatus, SuggestionEngine};
pub use error::EngineError;
pub use history::{InteractionContext, UserInteraction};
pub use provider::{AiError, ProviderKind, ProviderSet, TextCompletion};
pub use quota::{SessionLimits, Tier};
pub use scoring::ScoringContext;
pub use suggestion::types::{
    OptimizedSuggestion, Priority, PromptSuggestion, SuggestionType, Timeframe,
};
