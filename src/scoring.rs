//! Heuristic relevance scoring and ranking
//!
//! Pure functions, kept free of network and cache concerns so the scoring
//! rules can be unit-tested in isolation. A score starts at the 0.5 base and
//! accumulates query-keyword, history, and preference bonuses, capped at 1.0.
//!
//! Ranking applies the caller-side contract on top: drop below the relevance
//! floor, sort descending, truncate, and only then apply the extra
//! preferred-category bump. The order of those steps is part of the contract.

use crate::suggestion::PromptSuggestion;

/// Score every candidate starts from.
const BASE_SCORE: f64 = 0.5;

/// Maximum bonus for query-keyword overlap.
const KEYWORD_WEIGHT: f64 = 0.3;

/// Bonus when past queries reference the candidate's category or tags.
const HISTORY_BONUS: f64 = 0.15;

/// Bonus when a stated preference matches the category or a tag.
const PREFERENCE_BONUS: f64 = 0.2;

/// Post-filter bump for candidates in a preferred category.
const PREFERRED_CATEGORY_BUMP: f64 = 0.1;

/// Candidates scoring below this are dropped before ranking.
pub const MIN_RELEVANCE: f64 = 0.6;

/// Ranked output is truncated to this many candidates.
pub const MAX_RESULTS: usize = 8;

/// User context consulted while scoring.
#[derive(Debug, Clone, Default)]
pub struct ScoringContext {
    pub previous_queries: Vec<String>,
    pub user_preferences: Vec<String>,
}

/// Score a suggestion's fit to a query and user context, in [0, 1].
///
/// An empty query contributes no keyword term, leaving the base score plus
/// any context bonuses.
pub fn score(suggestion: &PromptSuggestion, query: &str, context: &ScoringContext) -> f64 {
    let mut score = BASE_SCORE;

    let haystack = format!(
        "{} {} {}",
        suggestion.title,
        suggestion.description,
        suggestion.tags.join(" ")
    )
    .to_lowercase();

    let query_words: Vec<String> = query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if !query_words.is_empty() {
        let matched = query_words
            .iter()
            .filter(|word| haystack.contains(word.as_str()))
            .count();
        score += KEYWORD_WEIGHT * matched as f64 / query_words.len() as f64;
    }

    if references_suggestion(&context.previous_queries, suggestion) {
        score += HISTORY_BONUS;
    }

    let preference_match = context.user_preferences.iter().any(|pref| {
        pref.eq_ignore_ascii_case(&suggestion.category)
            || suggestion
                .tags
                .iter()
                .any(|tag| tag.eq_ignore_ascii_case(pref))
    });
    if preference_match {
        score += PREFERENCE_BONUS;
    }

    score.min(1.0)
}

/// True when any past query textually references the suggestion's category
/// or one of its tags.
fn references_suggestion(previous_queries: &[String], suggestion: &PromptSuggestion) -> bool {
    let category = suggestion.category.to_lowercase();
    let tags: Vec<String> = suggestion.tags.iter().map(|t| t.to_lowercase()).collect();

    previous_queries.iter().any(|past| {
        let past = past.to_lowercase();
        (!category.is_empty() && past.contains(&category))
            || tags.iter().any(|tag| !tag.is_empty() && past.contains(tag))
    })
}

/// Apply the full ranking contract: score, filter, sort, truncate, then the
/// preferred-category bump.
pub fn rank(
    mut suggestions: Vec<PromptSuggestion>,
    query: &str,
    context: &ScoringContext,
) -> Vec<PromptSuggestion> {
    for suggestion in &mut suggestions {
        suggestion.relevance_score = score(suggestion, query, context);
    }

    suggestions.retain(|s| s.relevance_score >= MIN_RELEVANCE);
    suggestions.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    suggestions.truncate(MAX_RESULTS);

    // The bump lands after filtering and truncation, so it can neither
    // rescue a dropped candidate nor change which ones survive
    for suggestion in &mut suggestions {
        let preferred = context
            .user_preferences
            .iter()
            .any(|pref| pref.eq_ignore_ascii_case(&suggestion.category));
        if preferred {
            suggestion.relevance_score =
                (suggestion.relevance_score + PREFERRED_CATEGORY_BUMP).min(1.0);
        }
    }

    suggestions
}

#[cfg(test)]
#[path = "scoring_tests.rs"]
mod scoring_tests;
