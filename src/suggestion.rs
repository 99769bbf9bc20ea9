//! Suggestion data model and provider-response parsing

pub mod parser;
pub mod types;

pub use types::{
    BatchRequest, OptimizedSuggestion, Priority, PromptSuggestion, SuggestionType, Timeframe,
};
