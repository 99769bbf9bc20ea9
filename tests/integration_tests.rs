//! End-to-end tests of the public engine surface, with stubbed providers.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use promptdeck::{
    AiError, CacheStore, EngineError, InteractionContext, MemoryCache, ProviderKind, ProviderSet,
    SuggestionEngine, SuggestionType, TextCompletion, Tier, Timeframe, UserInteraction,
};

/// Canned-response provider for driving the engine without a network.
struct StubProvider {
    kind: ProviderKind,
    response: Option<String>,
    calls: AtomicUsize,
}

impl StubProvider {
    fn responding(kind: ProviderKind, response: &str) -> Arc<Self> {
        Arc::new(StubProvider {
            kind,
            response: Some(response.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn unreachable(kind: ProviderKind) -> Arc<Self> {
        Arc::new(StubProvider {
            kind,
            response: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextCompletion for StubProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn complete(&self, _prompt: &str) -> Result<String, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.response {
            Some(text) => Ok(text.clone()),
            None => Err(AiError::Network {
                provider: self.kind.to_string(),
                message: "connection refused".to_string(),
            }),
        }
    }
}

fn contract_response(titles: &[&str]) -> String {
    let suggestions: Vec<serde_json::Value> = titles
        .iter()
        .map(|title| {
            serde_json::json!({
                "title": title,
                "description": format!("How to approach {title}"),
                "prompt": format!("Write a detailed prompt about {title}"),
                "category": "marketing",
                "tags": ["growth"],
                "complexity": 3,
            })
        })
        .collect();
    serde_json::json!({ "suggestions": suggestions }).to_string()
}

fn engine(
    creative: Arc<StubProvider>,
    structured: Arc<StubProvider>,
) -> (SuggestionEngine, Arc<MemoryCache>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let cache = Arc::new(MemoryCache::new());
    let providers = ProviderSet::new(creative, structured);
    (SuggestionEngine::new(providers, cache.clone()), cache)
}

#[tokio::test]
async fn test_full_batch_lifecycle_for_a_free_user() {
    let creative = StubProvider::responding(
        ProviderKind::Gemini,
        &contract_response(&["Brand voice", "Launch teaser"]),
    );
    let structured = StubProvider::unreachable(ProviderKind::OpenAi);
    let (engine, _cache) = engine(creative.clone(), structured);

    // First request generates and caches; the next nine are cache hits
    for _ in 0..10 {
        let batch = engine
            .process_batch_request(SuggestionType::Creative, "marketing", Some("alice"))
            .await
            .expect("within free quota");
        assert_eq!(batch.len(), 2);
        assert!(batch.iter().all(|s| s.provider_used == ProviderKind::Gemini));
    }
    assert_eq!(creative.calls(), 1);

    // The 11th request trips the free session limit
    let err = engine
        .process_batch_request(SuggestionType::Creative, "marketing", Some("alice"))
        .await
        .expect_err("free session limit is 10");
    let EngineError::QuotaExceeded {
        user_id,
        tier,
        request_count,
        ..
    } = err;
    assert_eq!(user_id, "alice");
    assert_eq!(tier, Tier::Free);
    assert_eq!(request_count, 10);

    // A tier upgrade unblocks the user without resetting counters
    engine.update_user_limits("alice", Tier::Pro);
    engine
        .process_batch_request(SuggestionType::Creative, "marketing", Some("alice"))
        .await
        .expect("pro limits are higher");
    let stats = engine.get_session_stats("alice").expect("known user");
    assert_eq!(stats.request_count, 11);
    assert!(stats.token_usage > 0);
}

#[tokio::test]
async fn test_structured_requests_use_the_structured_provider() {
    let creative = StubProvider::unreachable(ProviderKind::Gemini);
    let structured = StubProvider::responding(
        ProviderKind::OpenAi,
        &contract_response(&["Sprint retro template"]),
    );
    let (engine, _cache) = engine(creative.clone(), structured.clone());

    let batch = engine
        .process_batch_request(SuggestionType::Technical, "engineering", None)
        .await
        .expect("batch path never errors without a user");

    assert_eq!(batch.len(), 1);
    assert_eq!(structured.calls(), 1);
    assert_eq!(creative.calls(), 0);
}

#[tokio::test]
async fn test_total_provider_outage_still_yields_a_batch() {
    let creative = StubProvider::unreachable(ProviderKind::Gemini);
    let structured = StubProvider::unreachable(ProviderKind::OpenAi);
    let (engine, _cache) = engine(creative, structured);

    let batch = engine
        .process_batch_request(SuggestionType::Creative, "travel", None)
        .await
        .expect("fallback covers outages");

    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].category, "travel");
}

#[tokio::test]
async fn test_query_suggestions_are_ranked_and_personalization_activates() {
    let creative = StubProvider::responding(
        ProviderKind::Gemini,
        &contract_response(&["Email drip campaign", "Cold outreach opener"]),
    );
    let structured = StubProvider::unreachable(ProviderKind::OpenAi);
    let (engine, _cache) = engine(creative.clone(), structured);

    let ranked = engine
        .generate_suggestions("email campaign", "bob", None)
        .await;
    assert!(!ranked.is_empty());
    assert!(ranked.iter().all(|s| s.relevance_score >= 0.6));
    assert!(
        ranked
            .windows(2)
            .all(|w| w[0].relevance_score >= w[1].relevance_score)
    );

    // Two interactions is below the personalization threshold
    for query in ["email subject lines", "newsletter ideas"] {
        engine.record_interaction(UserInteraction {
            user_id: "bob".to_string(),
            query: query.to_string(),
            category: Some("marketing".to_string()),
            selected_suggestion_id: None,
            timestamp: Utc::now(),
            context: InteractionContext::default(),
        });
    }
    let below = engine.get_personalized_suggestions("bob", None).await;
    assert!(below.iter().all(|s| s.id.starts_with("trending_")));

    // The third interaction activates history-driven generation
    engine.record_interaction(UserInteraction {
        user_id: "bob".to_string(),
        query: "drip campaign cadence".to_string(),
        category: Some("marketing".to_string()),
        selected_suggestion_id: Some(ranked[0].id.clone()),
        timestamp: Utc::now(),
        context: InteractionContext::default(),
    });
    let personalized = engine.get_personalized_suggestions("bob", None).await;
    assert!(!personalized.is_empty());
    assert!(personalized.iter().all(|s| s.id.starts_with("personalized_")));
}

#[tokio::test]
async fn test_trending_outage_is_transient() {
    let creative = StubProvider::unreachable(ProviderKind::Gemini);
    let structured = StubProvider::unreachable(ProviderKind::OpenAi);
    let (engine, cache) = engine(creative, structured);

    assert!(
        engine
            .get_trending_suggestions(Timeframe::Month)
            .await
            .is_empty()
    );
    // The failure left nothing behind in the cache
    assert!(cache.get("trending:month").is_none());
}

#[tokio::test]
async fn test_cached_suggestion_wire_format() {
    let creative = StubProvider::responding(
        ProviderKind::Gemini,
        &contract_response(&["Brand voice"]),
    );
    let structured = StubProvider::unreachable(ProviderKind::OpenAi);
    let (engine, cache) = engine(creative, structured);

    engine
        .process_batch_request(SuggestionType::Creative, "marketing", None)
        .await
        .expect("generates");

    // Cached batches serialize with camelCase field names
    let raw = cache.get("batch:creative:marketing").expect("batch cached");
    let first = &raw[0];
    assert!(first.get("providerUsed").is_some());
    assert!(first.get("estimatedCost").is_some());
    assert!(first.get("expiresAt").is_some());
    assert_eq!(first["category"], "marketing");
}

#[tokio::test]
async fn test_quota_error_message_names_the_user_and_tier() {
    let creative = StubProvider::responding(
        ProviderKind::Gemini,
        &contract_response(&["Brand voice"]),
    );
    let structured = StubProvider::unreachable(ProviderKind::OpenAi);
    let (engine, _cache) = engine(creative, structured);

    for _ in 0..10 {
        engine
            .process_batch_request(SuggestionType::Creative, "marketing", Some("carol"))
            .await
            .expect("within quota");
    }
    let err = engine
        .process_batch_request(SuggestionType::Creative, "marketing", Some("carol"))
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("carol"));
    assert!(message.contains("free"));
}
