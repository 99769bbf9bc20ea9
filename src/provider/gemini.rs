//! Gemini API client
//!
//! Single-shot completions against the Google Generative Language API.
//! Uses reqwest for HTTP and tokio for async runtime.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use super::{AiError, ProviderKind, TextCompletion};

/// Gemini API endpoint
const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini API client for single-shot content generation
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// Create a new Gemini client
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

    /// Build the request body JSON for the generateContent endpoint
    fn build_request_body(&self, prompt: &str) -> Result<String, AiError> {
        #[derive(Serialize)]
        struct Part {
            text: String,
        }

        #[derive(Serialize)]
        struct Content {
            role: String,
            parts: Vec<Part>,
        }

        #[derive(Serialize)]
        struct RequestBody {
            contents: Vec<Content>,
        }

        let body = RequestBody {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        serde_json::to_string(&body).map_err(|e| AiError::Parse {
            provider: "Gemini".to_string(),
            message: format!("Failed to serialize request body: {}", e),
        })
    }

    /// Construct URL: `{GEMINI_API_URL}/{model}:generateContent?key={api_key}`
    fn build_url(&self) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            GEMINI_API_URL, self.model, self.api_key
        )
    }

    /// Extract the response text from `candidates[0].content.parts[*].text`
    fn extract_text(json: &Value) -> Option<String> {
        let parts = json
            .get("candidates")?
            .get(0)?
            .get("content")?
            .get("parts")?
            .as_array()?;

        let text: String = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect();

        if text.is_empty() { None } else { Some(text) }
    }
}

#[async_trait]
impl TextCompletion for GeminiClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        let body = self.build_request_body(prompt)?;
        let url = self.build_url();

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| AiError::Network {
                provider: "Gemini".to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let code = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AiError::Api {
                provider: "Gemini".to_string(),
                code,
                message,
            });
        }

        let json: Value = response.json().await.map_err(|e| AiError::Parse {
            provider: "Gemini".to_string(),
            message: e.to_string(),
        })?;

        Self::extract_text(&json).ok_or_else(|| AiError::Parse {
            provider: "Gemini".to_string(),
            message: "Response contained no candidate text".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_url_embeds_model_and_key() {
        let client = GeminiClient::new("key123".to_string(), "gemini-1.5-flash".to_string());
        let url = client.build_url();
        assert!(url.contains("/gemini-1.5-flash:generateContent"));
        assert!(url.ends_with("key=key123"));
    }

    #[test]
    fn test_build_request_body_wraps_prompt() {
        let client = GeminiClient::new("k".to_string(), "m".to_string());
        let body = client.build_request_body("hello").unwrap();
        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let json = json!({
            "candidates": [{
                "content": {
                    "parts": [{"text": "Hello "}, {"text": "world"}]
                }
            }]
        });
        assert_eq!(
            GeminiClient::extract_text(&json),
            Some("Hello world".to_string())
        );
    }

    #[test]
    fn test_extract_text_missing_candidates() {
        assert_eq!(GeminiClient::extract_text(&json!({})), None);
        assert_eq!(GeminiClient::extract_text(&json!({"candidates": []})), None);
    }
}
