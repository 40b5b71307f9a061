//! # HTTP API
//!
//! JSON endpoints for expenses and budgets. Every `/api` route except
//! `/api/health` identifies the caller through the `x-user-id` header.
//!
//! ## Endpoints
//!
//! - `POST /api/expenses` - Record an expense and attach budget advice (201)
//! - `GET /api/expenses` - List expenses with paging and filters
//! - `PUT /api/expenses/:id` - Update an owned expense
//! - `DELETE /api/expenses/:id` - Delete an owned expense
//! - `GET /api/expenses/analytics` - Spending per category and per month
//! - `GET /api/expenses/currency-rates?base=` - Full rate table for a currency
//! - `POST /api/budget/set` - Create or overwrite a monthly budget
//! - `GET /api/budget?month=&year=` - Fetch a monthly budget
//! - `GET /api/health` - Liveness and cache sizes
//! - `GET /metrics` - Prometheus metrics
//!
//! ## Error Handling
//!
//! ```json
//! {
//!   "error": {
//!     "message": "Invalid amount: amount must be a positive number",
//!     "code": "validation_error",
//!     "details": { "field": "amount" }
//!   }
//! }
//! ```

pub mod auth;
mod budget;
mod expenses;
mod health;
pub mod types;

pub use auth::{UserId, USER_ID_HEADER};
pub use types::*;

use crate::advisor::{ModelTier, SuggestionCache, SuggestionEngine};
use crate::budgets::BudgetService;
use crate::clock::Clock;
use crate::config::SpendwiseConfig;
use crate::expenses::ExpenseService;
use crate::metrics::MetricsCollector;
use crate::rates::{ExchangeRateCache, RateLimiter, RateProvider};
use crate::store::MemoryStore;
use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Maximum request body size (1 MB).
const MAX_BODY_SIZE: usize = 1024 * 1024;

/// The long-lived service objects behind the API.
#[derive(Clone)]
pub struct Services {
    pub expenses: Arc<ExpenseService>,
    pub budgets: Arc<BudgetService>,
    pub rates: Arc<ExchangeRateCache>,
    pub suggestions: Arc<SuggestionCache>,
}

impl Services {
    /// Wire the services from configuration and the given collaborators.
    pub fn new(
        config: &SpendwiseConfig,
        rate_provider: Arc<dyn RateProvider>,
        model_tiers: Vec<ModelTier>,
        store: Arc<MemoryStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(
            config.exchange.min_interval_ms,
        )));
        let rates = Arc::new(
            ExchangeRateCache::new(
                rate_provider,
                limiter,
                Arc::clone(&clock),
                chrono::Duration::seconds(config.exchange.rate_ttl_seconds as i64),
            )
            .with_fetch_attempts(config.exchange.fetch_attempts),
        );
        let suggestions = Arc::new(SuggestionCache::new(
            chrono::Duration::seconds(config.advisor.cache_ttl_seconds as i64),
            config.advisor.cache_max_entries,
            Arc::clone(&clock),
        ));
        let engine = Arc::new(
            SuggestionEngine::new(model_tiers, Arc::clone(&rates), Arc::clone(&suggestions))
                .with_prompt_logging(config.logging.log_prompts),
        );
        let expenses = Arc::new(ExpenseService::new(
            store.clone(),
            Arc::clone(&rates),
            engine,
            Arc::clone(&clock),
            config.expenses.clone(),
        ));
        let budgets = Arc::new(BudgetService::new(store, clock));

        Self {
            expenses,
            budgets,
            rates,
            suggestions,
        }
    }
}

/// Shared application state accessible to all handlers.
pub struct AppState {
    pub config: Arc<SpendwiseConfig>,
    pub expenses: Arc<ExpenseService>,
    pub budgets: Arc<BudgetService>,
    pub rates: Arc<ExchangeRateCache>,
    pub suggestions: Arc<SuggestionCache>,
    /// Metrics collector for observability
    pub metrics_collector: Arc<MetricsCollector>,
}

impl AppState {
    pub fn new(config: Arc<SpendwiseConfig>, services: Services) -> Self {
        // Reuses a detached recorder when one is already installed (tests).
        let prometheus_handle = crate::metrics::setup_metrics().unwrap_or_else(|e| {
            tracing::debug!("Metrics already initialized, creating new handle: {}", e);
            crate::metrics::PrometheusBuilder::new()
                .build_recorder()
                .handle()
        });
        let metrics_collector = Arc::new(MetricsCollector::new(Instant::now(), prometheus_handle));

        Self {
            config,
            expenses: services.expenses,
            budgets: services.budgets,
            rates: services.rates,
            suggestions: services.suggestions,
            metrics_collector,
        }
    }
}

/// Create the main API router with all endpoints configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/expenses", post(expenses::create).get(expenses::list))
        .route("/expenses/analytics", get(expenses::analytics))
        .route("/expenses/currency-rates", get(expenses::currency_rates))
        .route(
            "/expenses/:id",
            put(expenses::update).delete(expenses::delete),
        )
        .route("/budget/set", post(budget::set))
        .route("/budget", get(budget::get))
        .route("/health", get(health::handle));

    Router::new()
        .nest("/api", api)
        .route("/metrics", get(crate::metrics::handler::metrics_handler))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.config.server.request_timeout_seconds,
        )))
        .layer(cors_layer(&state.config.server.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(USER_ID_HEADER),
        ])
}
