//! Shared test doubles for provider-dependent tests

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::provider::{AiError, ProviderKind, TextCompletion};

/// What a [`MockProvider`] does when invoked.
pub enum MockBehavior {
    /// Return this response text
    Respond(String),
    /// Return this response text after a delay
    RespondAfter(String, std::time::Duration),
    /// Fail with a network error
    FailNetwork,
}

/// Scriptable `TextCompletion` double that counts invocations.
pub struct MockProvider {
    kind: ProviderKind,
    behavior: Mutex<MockBehavior>,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn returning(kind: ProviderKind, response: impl Into<String>) -> Self {
        Self {
            kind,
            behavior: Mutex::new(MockBehavior::Respond(response.into())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn returning_after(
        kind: ProviderKind,
        response: impl Into<String>,
        delay: std::time::Duration,
    ) -> Self {
        Self {
            kind,
            behavior: Mutex::new(MockBehavior::RespondAfter(response.into(), delay)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(kind: ProviderKind) -> Self {
        Self {
            kind,
            behavior: Mutex::new(MockBehavior::FailNetwork),
            calls: AtomicUsize::new(0),
        }
    }

    /// How many times `complete` has been invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Replace the scripted behavior mid-test.
    pub fn set_response(&self, response: impl Into<String>) {
        *self.behavior.lock().unwrap() = MockBehavior::Respond(response.into());
    }
}

#[async_trait]
impl TextCompletion for MockProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn complete(&self, _prompt: &str) -> Result<String, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        // Copy the scripted outcome out before any await point
        enum Outcome {
            Ok(String),
            OkAfter(String, std::time::Duration),
            Fail,
        }
        let outcome = match &*self.behavior.lock().unwrap() {
            MockBehavior::Respond(text) => Outcome::Ok(text.clone()),
            MockBehavior::RespondAfter(text, delay) => Outcome::OkAfter(text.clone(), *delay),
            MockBehavior::FailNetwork => Outcome::Fail,
        };

        match outcome {
            Outcome::Ok(text) => Ok(text),
            Outcome::OkAfter(text, delay) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
            Outcome::Fail => Err(AiError::Network {
                provider: self.kind.name().to_string(),
                message: "connection refused".to_string(),
            }),
        }
    }
}

/// Build a contract-valid response carrying `count` suggestions whose titles
/// all start with `title_stem`.
pub fn suggestion_json(count: usize, title_stem: &str) -> String {
    let suggestions: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            serde_json::json!({
                "title": format!("{title_stem} {i}"),
                "description": format!("Description for {title_stem} {i}"),
                "prompt": format!("Prompt body for {title_stem} {i}"),
                "category": "general",
                "tags": ["sample"],
                "complexity": 2,
            })
        })
        .collect();
    serde_json::json!({ "suggestions": suggestions }).to_string()
}
