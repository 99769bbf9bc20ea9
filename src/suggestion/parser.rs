//! Provider response parsing and repair
//!
//! Providers are asked for strict JSON in the shape
//! `{"suggestions": [{title, description, prompt, tags, complexity}, ...]}`,
//! but real responses arrive wrapped in markdown fences, prefixed with prose,
//! or with optional fields missing. This module extracts the JSON object,
//! parses it, and normalizes each entry (missing `tags` become `[]`, missing
//! or out-of-range `complexity` becomes 3).

use serde::Deserialize;

/// Default complexity when the provider omits the field or sends junk.
const DEFAULT_COMPLEXITY: u8 = 3;

/// A provider suggestion after parsing and field repair.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSuggestion {
    pub title: String,
    pub description: String,
    pub prompt: String,
    /// Only requested on the query-path contracts; batch requests carry
    /// their own category
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub complexity: u8,
}

#[derive(Deserialize)]
struct RawResponse {
    suggestions: Vec<RawSuggestion>,
}

#[derive(Deserialize)]
struct RawSuggestion {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    prompt: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    complexity: Option<f64>,
}

/// Parse the suggestion list out of a provider response.
///
/// Returns `None` when no JSON object can be located or the object does not
/// match the contract. Callers convert that into fallback output; parse
/// failure never propagates.
pub fn parse_suggestions(response: &str) -> Option<Vec<ParsedSuggestion>> {
    let json = extract_json_object(response)?;
    let raw: RawResponse = serde_json::from_str(json).ok()?;
    if raw.suggestions.is_empty() {
        return None;
    }
    Some(raw.suggestions.into_iter().map(repair).collect())
}

fn repair(raw: RawSuggestion) -> ParsedSuggestion {
    ParsedSuggestion {
        title: raw.title,
        description: raw.description,
        prompt: raw.prompt,
        category: raw.category.filter(|c| !c.trim().is_empty()),
        tags: raw.tags,
        complexity: normalize_complexity(raw.complexity),
    }
}

/// Clamp complexity to 1..=5, defaulting anything unusable to 3.
fn normalize_complexity(value: Option<f64>) -> u8 {
    match value {
        Some(v) if v.is_finite() && (1.0..=5.0).contains(&v) => v.round() as u8,
        _ => DEFAULT_COMPLEXITY,
    }
}

/// Slice out the outermost JSON object from a response that may carry
/// markdown fences or surrounding prose.
fn extract_json_object(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&response[start..=end])
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod parser_tests;
