//! Suggestion engine against a mock Gemini API.

use serde_json::json;
use spendwise::advisor::{
    AdvisorError, GeminiModel, ModelErrorKind, ModelTier, RetryPolicy, SuggestionCache,
    SuggestionEngine, TextModel,
};
use spendwise::clock::ManualClock;
use spendwise::domain::{Category, Currency, ExpenseLine};
use spendwise::rates::{ExchangeRateCache, HttpRateProvider, RateLimiter};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FLASH: &str = "gemini-1.5-flash";
const PRO: &str = "gemini-1.5-pro";

fn gemini(server: &MockServer, model: &str) -> GeminiModel {
    GeminiModel::new(
        model.to_string(),
        server.uri(),
        "k".to_string(),
        reqwest::Client::new(),
        Duration::from_millis(500),
    )
}

fn reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{ "content": { "parts": [{ "text": text }] } }]
    }))
}

fn engine(server: &MockServer, attempts: u32) -> SuggestionEngine {
    let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
    let rates = Arc::new(ExchangeRateCache::new(
        Arc::new(HttpRateProvider::new(
            server.uri(),
            None,
            reqwest::Client::new(),
            Duration::from_millis(500),
        )),
        Arc::new(RateLimiter::new(Duration::ZERO)),
        clock.clone(),
        chrono::Duration::hours(24),
    ));
    let cache = Arc::new(SuggestionCache::new(chrono::Duration::hours(1), 100, clock));
    let policy = RetryPolicy::new(attempts, Duration::from_millis(5));
    SuggestionEngine::new(
        vec![
            ModelTier::new(Arc::new(gemini(server, FLASH)), policy),
            ModelTier::new(Arc::new(gemini(server, PRO)), policy),
        ],
        rates,
        cache,
    )
}

fn food(amount: f64) -> ExpenseLine {
    ExpenseLine {
        category: Category::Food,
        amount,
        currency: Currency::Usd,
    }
}

#[tokio::test]
async fn test_generate_sends_prompt_and_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{}:generateContent", FLASH)))
        .and(query_param("key", "k"))
        .and(body_string_contains("budget optimization tips"))
        .respond_with(reply("- tip"))
        .expect(1)
        .mount(&server)
        .await;

    let text = gemini(&server, FLASH)
        .generate("budget optimization tips please")
        .await
        .unwrap();
    assert_eq!(text, "- tip");
}

#[tokio::test]
async fn test_status_codes_classified() {
    let server = MockServer::start().await;
    for (model, status) in [("m429", 429), ("m503", 503), ("m500", 500)] {
        Mock::given(method("POST"))
            .and(path(format!("/v1beta/models/{}:generateContent", model)))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
    }

    let kind_of = |model: &str| gemini(&server, model);
    let err = kind_of("m429").generate("p").await.unwrap_err();
    assert_eq!(err.kind, ModelErrorKind::RateLimited);
    let err = kind_of("m503").generate("p").await.unwrap_err();
    assert_eq!(err.kind, ModelErrorKind::Unavailable);
    let err = kind_of("m500").generate("p").await.unwrap_err();
    assert_eq!(err.kind, ModelErrorKind::Fatal);
}

#[tokio::test]
async fn test_slow_model_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(reply("late").set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let err = gemini(&server, FLASH).generate("p").await.unwrap_err();
    assert_eq!(err.kind, ModelErrorKind::Unavailable);
}

#[tokio::test]
async fn test_quota_exhausted_primary_falls_back_to_secondary() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{}:generateContent", FLASH)))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{}:generateContent", PRO)))
        .respond_with(reply("- keep food under control"))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine(&server, 3);
    let text = engine.suggest(&[food(30.0)], 36.0, "u1").await.unwrap();
    assert_eq!(text, "- keep food under control");

    // Served from the cache: the mocks above would see extra calls otherwise.
    let again = engine.suggest(&[food(30.0)], 36.0, "u1").await.unwrap();
    assert_eq!(again, text);
}

#[tokio::test]
async fn test_bad_request_aborts_without_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{}:generateContent", FLASH)))
        .respond_with(ResponseTemplate::new(400).set_body_string("API key not valid"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{}:generateContent", PRO)))
        .respond_with(reply("unused"))
        .expect(0)
        .mount(&server)
        .await;

    let err = engine(&server, 3)
        .suggest(&[food(1.0)], 100.0, "u1")
        .await
        .unwrap_err();
    assert!(matches!(err, AdvisorError::Unavailable(ref m) if m.contains("API key not valid")));
}
