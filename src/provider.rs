//! LLM provider abstraction
//!
//! Defines the `TextCompletion` trait, the `AiError` taxonomy, and the
//! `ProviderSet` pairing the two backends this engine selects between:
//! Gemini for creative/trending generation, OpenAI for structured/technical
//! generation. Uses async/await with tokio and reqwest for non-blocking HTTP.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::suggestion::SuggestionType;

mod gemini;
mod openai;
pub mod selector;

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

/// Errors that can occur during provider calls
///
/// None of these reach engine callers: generation failures are converted to
/// fallback output. `NotConfigured` surfaces only at construction time.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AiError {
    /// Provider is not configured (missing API key or model)
    #[error("[{provider}] Not configured: {message}")]
    NotConfigured { provider: String, message: String },

    /// Network error during API request
    #[error("[{provider}] Network error: {message}")]
    Network { provider: String, message: String },

    /// API returned an error response
    #[error("[{provider}] API error ({code}): {message}")]
    Api {
        provider: String,
        code: u16,
        message: String,
    },

    /// Failed to parse API response
    #[error("[{provider}] Parse error: {message}")]
    Parse { provider: String, message: String },
}

/// The two LLM backends this engine selects between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Provider for open-ended/creative generation
    Gemini,
    /// Provider for strictly-structured generation
    OpenAi,
}

impl ProviderKind {
    /// Returns the display name of the provider
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "Gemini",
            ProviderKind::OpenAi => "OpenAI",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Single-shot text completion against an LLM backend.
///
/// Object-safe so the engine can be constructed with test doubles.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    /// Which backend this client talks to
    fn kind(&self) -> ProviderKind;

    /// Send one prompt and return the full response text
    async fn complete(&self, prompt: &str) -> Result<String, AiError>;
}

/// The provider pair the engine routes between.
#[derive(Clone)]
pub struct ProviderSet {
    creative: Arc<dyn TextCompletion>,
    structured: Arc<dyn TextCompletion>,
}

impl ProviderSet {
    /// Pair an explicit creative and structured backend (used by tests to
    /// inject doubles).
    pub fn new(creative: Arc<dyn TextCompletion>, structured: Arc<dyn TextCompletion>) -> Self {
        Self {
            creative,
            structured,
        }
    }

    /// Build the real Gemini/OpenAI pair from configuration.
    ///
    /// Returns an error if either provider is missing its API key.
    pub fn from_config(config: &Config) -> Result<Self, AiError> {
        let gemini = config
            .providers
            .gemini
            .api_key
            .as_ref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AiError::NotConfigured {
                provider: "Gemini".to_string(),
                message: "Missing API key. Add 'api_key' in the [providers.gemini] section."
                    .to_string(),
            })?;

        let openai = config
            .providers
            .openai
            .api_key
            .as_ref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AiError::NotConfigured {
                provider: "OpenAI".to_string(),
                message: "Missing API key. Add 'api_key' in the [providers.openai] section."
                    .to_string(),
            })?;

        Ok(Self {
            creative: Arc::new(GeminiClient::new(
                gemini.clone(),
                config.providers.gemini.model.clone(),
            )),
            structured: Arc::new(OpenAiClient::new(
                openai.clone(),
                config.providers.openai.model.clone(),
            )),
        })
    }

    /// Route a batch request's content type to its backend.
    pub fn for_type(&self, suggestion_type: SuggestionType) -> &dyn TextCompletion {
        match selector::provider_for(suggestion_type) {
            ProviderKind::Gemini => self.creative.as_ref(),
            ProviderKind::OpenAi => self.structured.as_ref(),
        }
    }

    /// The creative backend, used for the open-ended query, trending, and
    /// personalized paths.
    pub fn creative(&self) -> &dyn TextCompletion {
        self.creative.as_ref()
    }
}
