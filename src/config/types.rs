// Configuration type definitions

use serde::Deserialize;

/// Default Gemini model for creative/trending generation
fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

/// Default OpenAI model for structured/technical generation
fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

/// Default spacing between queued batch executions, in milliseconds.
/// Respects upstream provider rate limits when the queue drains.
fn default_batch_spacing_ms() -> u64 {
    500
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub engine: EngineSettings,
}

/// Provider credentials and model selection
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
}

/// Gemini-specific configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    /// API key (required when the engine is constructed from config)
    pub api_key: Option<String>,
    #[serde(default = "default_gemini_model")]
    pub model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_key: None,
            model: default_gemini_model(),
        }
    }
}

/// OpenAI-specific configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    /// API key (required when the engine is constructed from config)
    pub api_key: Option<String>,
    #[serde(default = "default_openai_model")]
    pub model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        OpenAiConfig {
            api_key: None,
            model: default_openai_model(),
        }
    }
}

/// Engine tuning knobs
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// Delay between queued batch executions in milliseconds
    #[serde(default = "default_batch_spacing_ms")]
    pub batch_spacing_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            batch_spacing_ms: default_batch_spacing_ms(),
        }
    }
}
