//! Shared test utilities for Spendwise integration tests.
//!
//! Builds the full router against wiremock servers standing in for the
//! exchange rate provider and the Gemini API.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use spendwise::api::{create_router, AppState, Services, USER_ID_HEADER};
use spendwise::cli::serve::build_model_tiers;
use spendwise::clock::SystemClock;
use spendwise::config::{ModelConfig, SpendwiseConfig};
use spendwise::advisor::ModelTier;
use spendwise::rates::{HttpRateProvider, RateProvider};
use spendwise::store::MemoryStore;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PRIMARY_MODEL: &str = "gemini-1.5-flash";
pub const SECONDARY_MODEL: &str = "gemini-1.5-pro";
pub const TEST_API_KEY: &str = "test-key";

/// Config pointing both upstreams at mock servers, with no pacing and
/// millisecond backoff so tests run quickly.
pub fn test_config(rates_url: &str, ai_url: &str) -> SpendwiseConfig {
    let mut config = SpendwiseConfig::default();
    config.exchange.base_url = rates_url.to_string();
    config.exchange.api_key_env = None;
    config.exchange.min_interval_ms = 0;
    config.exchange.timeout_seconds = 2;
    config.advisor.base_url = ai_url.to_string();
    config.advisor.timeout_seconds = 2;
    config.advisor.models = vec![
        ModelConfig {
            max_attempts: 2,
            base_delay_ms: 5,
            ..ModelConfig::new(PRIMARY_MODEL)
        },
        ModelConfig {
            max_attempts: 2,
            base_delay_ms: 5,
            ..ModelConfig::new(SECONDARY_MODEL)
        },
    ];
    config
}

pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
}

pub fn build_app(config: SpendwiseConfig) -> TestApp {
    let client = reqwest::Client::new();
    let provider = Arc::new(HttpRateProvider::new(
        config.exchange.base_url.clone(),
        None,
        client.clone(),
        Duration::from_secs(config.exchange.timeout_seconds),
    ));
    let tiers = build_model_tiers(&config, Some(TEST_API_KEY.to_string()), &client);
    build_app_with(config, provider, tiers)
}

/// App over an arbitrary rate provider and model tiers.
pub fn build_app_with(
    config: SpendwiseConfig,
    provider: Arc<dyn RateProvider>,
    tiers: Vec<ModelTier>,
) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let services = Services::new(
        &config,
        provider,
        tiers,
        Arc::clone(&store),
        Arc::new(SystemClock),
    );
    let state = Arc::new(AppState::new(Arc::new(config), services));
    TestApp {
        router: create_router(Arc::clone(&state)),
        state,
        store,
    }
}

/// App wired to fresh rate and model mock servers.
pub async fn app_with_mocks() -> (TestApp, MockServer, MockServer) {
    let rates = MockServer::start().await;
    let ai = MockServer::start().await;
    let app = build_app(test_config(&rates.uri(), &ai.uri()));
    (app, rates, ai)
}

impl TestApp {
    /// Send one request and decode the JSON response body.
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    pub async fn create_expense(&self, user: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", "/api/expenses", Some(user), Some(body))
            .await
    }
}

/// Serve `{"rates": {"USD": usd_rate}}` for one base currency.
pub async fn mount_rates(server: &MockServer, base: &str, usd_rate: f64) {
    Mock::given(method("GET"))
        .and(path(format!("/v4/latest/{}", base)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "base": base,
            "rates": { "USD": usd_rate }
        })))
        .mount(server)
        .await;
}

pub fn gemini_path(model: &str) -> String {
    format!("/v1beta/models/{}:generateContent", model)
}

pub fn gemini_body(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }], "role": "model" },
            "finishReason": "STOP"
        }]
    })
}

/// Answer every generateContent call for `model` with `text`.
pub async fn mount_gemini(server: &MockServer, model: &str, text: &str) {
    Mock::given(method("POST"))
        .and(path(gemini_path(model)))
        .and(query_param("key", TEST_API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body(text)))
        .mount(server)
        .await;
}

/// Fail every generateContent call for `model` with `status`.
pub async fn mount_gemini_error(server: &MockServer, model: &str, status: u16) {
    Mock::given(method("POST"))
        .and(path(gemini_path(model)))
        .respond_with(ResponseTemplate::new(status).set_body_string("quota exceeded"))
        .mount(server)
        .await;
}
