//! Personalization signal derivation
//!
//! Pure functions over a user's interaction history (≤50 entries). The three
//! derived signals (frequent categories, common keywords, and a coarse
//! preference label) are injected into the personalized generation prompt.
//! Ties break alphabetically so signal order is deterministic for a given
//! history.

use std::collections::HashMap;

use crate::history::UserInteraction;

/// Personalized generation requires at least this many recorded
/// interactions; below it, trending suggestions are served instead.
pub const MIN_HISTORY_FOR_PERSONALIZATION: usize = 3;

/// How many top categories feed the prompt.
const MAX_FREQUENT_CATEGORIES: usize = 3;

/// How many top keywords feed the prompt.
const MAX_COMMON_KEYWORDS: usize = 10;

/// Words this short never count as keywords.
const MIN_KEYWORD_LEN: usize = 4;

/// Filler words excluded from keyword extraction.
const STOP_WORDS: &[&str] = &[
    "about", "after", "best", "could", "does", "each", "from", "have", "here", "into", "just",
    "like", "make", "more", "most", "need", "over", "should", "some", "than", "that", "their",
    "them", "then", "there", "these", "they", "this", "want", "what", "when", "where", "which",
    "will", "with", "would", "your",
];

/// Vocabulary hinting at business-oriented interests.
const BUSINESS_TERMS: &[&str] = &[
    "business",
    "marketing",
    "sales",
    "strategy",
    "revenue",
    "startup",
    "management",
    "finance",
    "career",
    "productivity",
];

/// Vocabulary hinting at personal-development interests.
const PERSONAL_TERMS: &[&str] = &[
    "personal",
    "habit",
    "habits",
    "mindfulness",
    "health",
    "fitness",
    "wellness",
    "growth",
    "hobby",
    "journaling",
];

/// Coarse interest orientation derived from history vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceLabel {
    BusinessFocused,
    PersonalDevelopment,
}

impl PreferenceLabel {
    /// Label text as it appears in generation prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            PreferenceLabel::BusinessFocused => "business-focused",
            PreferenceLabel::PersonalDevelopment => "personal-development",
        }
    }
}

/// The signals fed into personalized generation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonalizationSignals {
    /// Top 3 categories by interaction count
    pub frequent_categories: Vec<String>,
    /// Top 10 query keywords by frequency
    pub common_keywords: Vec<String>,
    /// Set when one vocabulary clearly outweighs the other
    pub preference_label: Option<PreferenceLabel>,
}

/// Derive all three signals from a user's history.
pub fn derive_signals(history: &[UserInteraction]) -> PersonalizationSignals {
    PersonalizationSignals {
        frequent_categories: frequent_categories(history),
        common_keywords: common_keywords(history),
        preference_label: preference_label(history),
    }
}

/// Top categories by interaction count, ties broken alphabetically.
fn frequent_categories(history: &[UserInteraction]) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for interaction in history {
        if let Some(category) = &interaction.category {
            let category = category.to_lowercase();
            if !category.is_empty() {
                *counts.entry(category).or_default() += 1;
            }
        }
    }
    top_entries(counts, MAX_FREQUENT_CATEGORIES)
}

/// Top query words by frequency, skipping short words and stop words.
fn common_keywords(history: &[UserInteraction]) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for interaction in history {
        for word in tokenize(&interaction.query) {
            *counts.entry(word).or_default() += 1;
        }
    }
    top_entries(counts, MAX_COMMON_KEYWORDS)
}

/// Compare business-term hits against personal-term hits across all queries.
fn preference_label(history: &[UserInteraction]) -> Option<PreferenceLabel> {
    let mut business_hits = 0usize;
    let mut personal_hits = 0usize;

    for interaction in history {
        for word in tokenize(&interaction.query) {
            if BUSINESS_TERMS.contains(&word.as_str()) {
                business_hits += 1;
            }
            if PERSONAL_TERMS.contains(&word.as_str()) {
                personal_hits += 1;
            }
        }
    }

    if business_hits > personal_hits {
        Some(PreferenceLabel::BusinessFocused)
    } else if personal_hits > business_hits {
        Some(PreferenceLabel::PersonalDevelopment)
    } else {
        None
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.len() >= MIN_KEYWORD_LEN && !STOP_WORDS.contains(word))
        .map(str::to_string)
        .collect::<Vec<_>>()
        .into_iter()
}

fn top_entries(counts: HashMap<String, usize>, limit: usize) -> Vec<String> {
    let mut entries: Vec<(String, usize)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(limit);
    entries.into_iter().map(|(word, _)| word).collect()
}

#[cfg(test)]
#[path = "personalization_tests.rs"]
mod personalization_tests;
