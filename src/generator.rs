//! Prompt construction, provider invocation, and result post-processing
//!
//! Each generation path builds a fixed instruction template, invokes a
//! provider, and parses the strict-JSON response into typed suggestions.
//! Failure handling differs by path on purpose: batch generation never
//! returns empty (a deterministic fallback stands in), the query path falls
//! back to query-derived suggestions, while the trending and personalized
//! paths surface the error so the engine can return an empty list without
//! caching it.

use chrono::Utc;

use crate::personalization::PersonalizationSignals;
use crate::provider::{AiError, ProviderKind, TextCompletion};
use crate::suggestion::parser::{self, ParsedSuggestion};
use crate::suggestion::types::{
    BatchRequest, OptimizedSuggestion, PromptSuggestion, Timeframe, batch_expiry,
};
use crate::suggestion::SuggestionType;

/// Cost per 1K estimated tokens, by provider.
const GEMINI_RATE_PER_1K: f64 = 0.0005;
const OPENAI_RATE_PER_1K: f64 = 0.0015;

/// Cap on personalized suggestions per generation.
const MAX_PERSONALIZED: usize = 6;

/// Personalized output is trusted more than ad hoc query matching.
const PERSONALIZED_RELEVANCE: f64 = 0.9;

/// The JSON contract appended to every batch prompt.
const BATCH_JSON_CONTRACT: &str = "Respond with ONLY valid JSON in this exact shape:\n\
{\"suggestions\": [{\"title\": \"...\", \"description\": \"...\", \"prompt\": \"...\", \"tags\": [\"...\"], \"complexity\": 3}]}\n\
Complexity is an integer from 1 (beginner) to 5 (expert). No markdown fences, no commentary.";

/// The JSON contract for the query-path prompts, which also carry a category.
const QUERY_JSON_CONTRACT: &str = "Respond with ONLY valid JSON in this exact shape:\n\
{\"suggestions\": [{\"title\": \"...\", \"description\": \"...\", \"prompt\": \"...\", \"category\": \"...\", \"tags\": [\"...\"], \"complexity\": 3}]}\n\
Complexity is an integer from 1 (beginner) to 5 (expert). No markdown fences, no commentary.";

/// Rough token estimate from word count (≈0.75 words per token).
pub fn estimate_tokens(text: &str) -> u32 {
    let words = text.split_whitespace().count();
    (words as f64 / 0.75).ceil() as u32
}

fn rate_per_1k(kind: ProviderKind) -> f64 {
    match kind {
        ProviderKind::Gemini => GEMINI_RATE_PER_1K,
        ProviderKind::OpenAi => OPENAI_RATE_PER_1K,
    }
}

/// Estimated generation cost for one suggestion's combined text.
fn estimate_cost(text: &str, kind: ProviderKind) -> f64 {
    f64::from(estimate_tokens(text)) / 1000.0 * rate_per_1k(kind)
}

/// Total estimated tokens across a generated batch, for quota accounting.
pub fn batch_tokens(batch: &[OptimizedSuggestion]) -> u64 {
    batch
        .iter()
        .map(|s| {
            u64::from(estimate_tokens(&format!(
                "{} {} {}",
                s.title, s.description, s.prompt
            )))
        })
        .sum()
}

// =========================================================================
// Batch path
// =========================================================================

/// Build the per-type batch instruction prompt.
pub fn build_batch_prompt(request: &BatchRequest) -> String {
    let count = request.count;
    let category = &request.category;

    let instruction = match request.suggestion_type {
        SuggestionType::Creative => format!(
            "You are a creative prompt curator. Generate {count} imaginative, \
             open-ended prompt suggestions for the '{category}' category. \
             Favor unexpected angles, vivid scenarios, and prompts that invite \
             exploration over rote exercises."
        ),
        SuggestionType::Structured => format!(
            "You are a prompt curator for structured work. Generate {count} \
             well-organized, step-by-step prompt suggestions for the \
             '{category}' category. Each prompt should state a clear goal, \
             concrete inputs, and an ordered sequence of steps."
        ),
        SuggestionType::Technical => format!(
            "You are a prompt curator for technical practitioners. Generate \
             {count} technically rigorous prompt suggestions for the \
             '{category}' category. Use precise domain terminology and target \
             real tasks a specialist would face."
        ),
        SuggestionType::Trending => format!(
            "You are a prompt curator tracking what is popular right now. \
             Generate {count} prompt suggestions for the '{category}' category \
             that reflect current trends, tools, and conversations."
        ),
    };

    format!("{instruction}\n\n{BATCH_JSON_CONTRACT}")
}

/// Generate a batch of suggestions, falling back on any failure.
///
/// Never returns an empty list and never errors: provider or parse failures
/// are converted to a single deterministic fallback suggestion.
pub async fn generate_batch(
    request: &BatchRequest,
    provider: &dyn TextCompletion,
) -> Vec<OptimizedSuggestion> {
    let prompt = build_batch_prompt(request);

    let parsed = match provider.complete(&prompt).await {
        Ok(response) => parser::parse_suggestions(&response),
        Err(e) => {
            log::warn!("Batch generation failed for '{}': {}", request.id, e);
            None
        }
    };

    match parsed {
        Some(suggestions) => finalize_batch(suggestions, request, provider.kind()),
        None => fallback_batch(request, provider.kind()),
    }
}

/// Assign ids, costs, and expiry stamps to parsed batch output.
fn finalize_batch(
    parsed: Vec<ParsedSuggestion>,
    request: &BatchRequest,
    kind: ProviderKind,
) -> Vec<OptimizedSuggestion> {
    let created_at = Utc::now();
    let millis = created_at.timestamp_millis();

    parsed
        .into_iter()
        .enumerate()
        .map(|(index, s)| {
            let combined = format!("{} {} {}", s.title, s.description, s.prompt);
            OptimizedSuggestion {
                id: format!(
                    "{}_{}_{}_{}",
                    request.suggestion_type.as_str(),
                    request.category,
                    millis,
                    index
                ),
                title: s.title,
                description: s.description,
                prompt: s.prompt,
                category: request.category.clone(),
                tags: s.tags,
                complexity: s.complexity,
                provider_used: kind,
                estimated_cost: estimate_cost(&combined, kind),
                created_at,
                expires_at: batch_expiry(created_at),
            }
        })
        .collect()
}

/// The single deterministic suggestion served when batch generation fails.
pub fn fallback_batch(request: &BatchRequest, kind: ProviderKind) -> Vec<OptimizedSuggestion> {
    let created_at = Utc::now();
    let type_name = request.suggestion_type.as_str();
    let category = &request.category;

    vec![OptimizedSuggestion {
        id: format!(
            "{}_{}_{}_0",
            type_name,
            category,
            created_at.timestamp_millis()
        ),
        title: format!("Getting started with {category}"),
        description: format!(
            "A {type_name} starting point for exploring the {category} category."
        ),
        prompt: format!(
            "Write a {type_name} piece about {category}: pick one concrete aspect, \
             describe it for a newcomer, and finish with three questions worth exploring next."
        ),
        category: category.clone(),
        tags: vec![category.clone(), type_name.to_string()],
        complexity: 3,
        provider_used: kind,
        estimated_cost: 0.0,
        created_at,
        expires_at: batch_expiry(created_at),
    }]
}

// =========================================================================
// Query path
// =========================================================================

/// Build the instruction prompt for ad hoc query suggestions.
pub fn build_query_prompt(query: &str) -> String {
    format!(
        "You are a prompt suggestion assistant. A user is looking for prompt \
         ideas related to: \"{query}\". Generate 8 suggestions directly \
         relevant to that request, each with a category that describes its \
         topic.\n\n{QUERY_JSON_CONTRACT}"
    )
}

/// Generate suggestions for one user query, falling back on any failure.
///
/// Fallback suggestions embed the query text so they still rank above the
/// relevance floor.
pub async fn generate_query(query: &str, provider: &dyn TextCompletion) -> Vec<PromptSuggestion> {
    let prompt = build_query_prompt(query);

    let parsed = match provider.complete(&prompt).await {
        Ok(response) => parser::parse_suggestions(&response),
        Err(e) => {
            log::warn!("Query generation failed for '{}': {}", query, e);
            None
        }
    };

    match parsed {
        Some(suggestions) => {
            let millis = Utc::now().timestamp_millis();
            suggestions
                .into_iter()
                .enumerate()
                .map(|(index, s)| to_prompt_suggestion(s, format!("query_{millis}_{index}")))
                .collect()
        }
        None => query_fallback(query),
    }
}

/// Deterministic query-derived suggestions served when generation fails.
pub fn query_fallback(query: &str) -> Vec<PromptSuggestion> {
    let millis = Utc::now().timestamp_millis();
    let templates = [
        (
            format!("Explore {query}"),
            format!("An open-ended look at {query} from first principles."),
            format!("Explain {query} to a newcomer: cover what it is, why it matters, and one common misconception."),
        ),
        (
            format!("Practical guide to {query}"),
            format!("A hands-on walkthrough for getting results with {query}."),
            format!("Write a step-by-step guide to {query}, with a concrete example at each step."),
        ),
        (
            format!("Questions about {query}"),
            format!("Prompts that probe {query} from different angles."),
            format!("List ten thought-provoking questions about {query}, ordered from basic to advanced."),
        ),
    ];

    templates
        .into_iter()
        .enumerate()
        .map(|(index, (title, description, prompt))| {
            let tokens = estimate_tokens(&prompt);
            PromptSuggestion {
                id: format!("query_{millis}_{index}"),
                title,
                description,
                category: "general".to_string(),
                prompt,
                tags: query.split_whitespace().map(str::to_lowercase).collect(),
                relevance_score: 0.0,
                estimated_tokens: tokens,
            }
        })
        .collect()
}

fn to_prompt_suggestion(parsed: ParsedSuggestion, id: String) -> PromptSuggestion {
    let tokens = estimate_tokens(&format!(
        "{} {} {}",
        parsed.title, parsed.description, parsed.prompt
    ));
    PromptSuggestion {
        id,
        title: parsed.title,
        description: parsed.description,
        category: parsed.category.unwrap_or_else(|| "general".to_string()),
        prompt: parsed.prompt,
        tags: parsed.tags,
        relevance_score: 0.0,
        estimated_tokens: tokens,
    }
}

// =========================================================================
// Trending path
// =========================================================================

/// Build the trending instruction prompt for a timeframe.
pub fn build_trending_prompt(timeframe: Timeframe) -> String {
    format!(
        "You are a prompt suggestion assistant tracking what people are asking \
         about {}. Generate 8 prompt suggestions tied to topics, tools, and \
         conversations that gained attention {}. Each needs a category \
         describing its topic.\n\n{QUERY_JSON_CONTRACT}",
        timeframe.phrase(),
        timeframe.phrase(),
    )
}

/// Generate trending suggestions for a timeframe.
///
/// Unlike the batch path there is no fallback: failure propagates so the
/// caller can return an empty list without caching it.
pub async fn generate_trending(
    timeframe: Timeframe,
    provider: &dyn TextCompletion,
) -> Result<Vec<PromptSuggestion>, AiError> {
    let prompt = build_trending_prompt(timeframe);
    let response = provider.complete(&prompt).await?;

    let parsed = parser::parse_suggestions(&response).ok_or_else(|| AiError::Parse {
        provider: provider.kind().name().to_string(),
        message: "Trending response did not match the suggestion contract".to_string(),
    })?;

    let millis = Utc::now().timestamp_millis();
    Ok(parsed
        .into_iter()
        .enumerate()
        .map(|(index, s)| {
            let mut suggestion = to_prompt_suggestion(
                s,
                format!("trending_{}_{millis}_{index}", timeframe.as_str()),
            );
            suggestion.relevance_score = 0.5;
            suggestion
        })
        .collect())
}

// =========================================================================
// Personalized path
// =========================================================================

/// Build the personalized instruction prompt from derived signals.
pub fn build_personalized_prompt(
    signals: &PersonalizationSignals,
    category: Option<&str>,
) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "You are a prompt suggestion assistant generating personalized ideas \
         for one specific user.\n\n## User profile\n",
    );

    if !signals.frequent_categories.is_empty() {
        prompt.push_str(&format!(
            "Frequent categories: {}\n",
            signals.frequent_categories.join(", ")
        ));
    }
    if !signals.common_keywords.is_empty() {
        prompt.push_str(&format!(
            "Common keywords: {}\n",
            signals.common_keywords.join(", ")
        ));
    }
    if let Some(label) = signals.preference_label {
        prompt.push_str(&format!("Overall orientation: {}\n", label.as_str()));
    }
    if let Some(category) = category {
        prompt.push_str(&format!("Requested category: {category}\n"));
    }

    prompt.push_str(&format!(
        "\nGenerate {MAX_PERSONALIZED} prompt suggestions tailored to this \
         profile. Each needs a category describing its topic.\n\n{QUERY_JSON_CONTRACT}"
    ));

    prompt
}

/// Generate personalized suggestions from derived signals.
///
/// Results carry a fixed relevance of 0.9. Failure propagates like the
/// trending path.
pub async fn generate_personalized(
    signals: &PersonalizationSignals,
    category: Option<&str>,
    provider: &dyn TextCompletion,
) -> Result<Vec<PromptSuggestion>, AiError> {
    let prompt = build_personalized_prompt(signals, category);
    let response = provider.complete(&prompt).await?;

    let parsed = parser::parse_suggestions(&response).ok_or_else(|| AiError::Parse {
        provider: provider.kind().name().to_string(),
        message: "Personalized response did not match the suggestion contract".to_string(),
    })?;

    let millis = Utc::now().timestamp_millis();
    Ok(parsed
        .into_iter()
        .take(MAX_PERSONALIZED)
        .enumerate()
        .map(|(index, s)| {
            let mut suggestion = to_prompt_suggestion(s, format!("personalized_{millis}_{index}"));
            suggestion.relevance_score = PERSONALIZED_RELEVANCE;
            if suggestion.category == "general" {
                if let Some(requested) = category {
                    suggestion.category = requested.to_string();
                }
            }
            suggestion
        })
        .collect())
}

#[cfg(test)]
#[path = "generator_tests.rs"]
mod generator_tests;
