//! Content-type to provider routing
//!
//! A fixed policy table, not learned: Gemini is empirically stronger at
//! open-ended/creative text, OpenAI at strictly-structured output.

use super::ProviderKind;
use crate::suggestion::SuggestionType;

/// Map a request's content type to the backend that handles it best.
pub fn provider_for(suggestion_type: SuggestionType) -> ProviderKind {
    match suggestion_type {
        SuggestionType::Creative | SuggestionType::Trending => ProviderKind::Gemini,
        SuggestionType::Structured | SuggestionType::Technical => ProviderKind::OpenAi,
    }
}
