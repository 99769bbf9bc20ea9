//! OpenAI API client
//!
//! Single-shot completions against the OpenAI Chat Completions API.
//! Uses reqwest for HTTP and tokio for async runtime.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use super::{AiError, ProviderKind, TextCompletion};

/// OpenAI API endpoint
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI API client for single-shot chat completions
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    /// Create a new OpenAI client
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
        }
    }

    /// Returns the stored model (used in tests)
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the request body JSON for the Chat Completions API
    ///
    /// Does not set max_tokens, allowing OpenAI to use its default.
    fn build_request_body(&self, prompt: &str) -> Result<String, AiError> {
        #[derive(Serialize)]
        struct Message {
            role: String,
            content: String,
        }

        #[derive(Serialize)]
        struct RequestBody {
            model: String,
            messages: Vec<Message>,
        }

        let body = RequestBody {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        serde_json::to_string(&body).map_err(|e| AiError::Parse {
            provider: "OpenAI".to_string(),
            message: format!("Failed to serialize request body: {}", e),
        })
    }

    /// Extract the response text from `choices[0].message.content`
    fn extract_text(json: &Value) -> Option<String> {
        json.get("choices")?
            .get(0)?
            .get("message")?
            .get("content")?
            .as_str()
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
    }
}

#[async_trait]
impl TextCompletion for OpenAiClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        let body = self.build_request_body(prompt)?;

        let response = self
            .client
            .post(OPENAI_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| AiError::Network {
                provider: "OpenAI".to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let code = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AiError::Api {
                provider: "OpenAI".to_string(),
                code,
                message,
            });
        }

        let json: Value = response.json().await.map_err(|e| AiError::Parse {
            provider: "OpenAI".to_string(),
            message: e.to_string(),
        })?;

        Self::extract_text(&json).ok_or_else(|| AiError::Parse {
            provider: "OpenAI".to_string(),
            message: "Response contained no message content".to_string(),
        })
    }
}
