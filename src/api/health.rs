//! Health check endpoint handler.

use crate::api::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
    pub caches: CacheCounts,
}

/// Live entries per cache.
#[derive(Debug, Serialize)]
pub struct CacheCounts {
    pub exchange_rates: usize,
    pub suggestions: usize,
}

/// GET /api/health
pub async fn handle(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        uptime_seconds: state.metrics_collector.uptime_seconds(),
        caches: CacheCounts {
            exchange_rates: state.rates.len(),
            suggestions: state.suggestions.len(),
        },
    })
}
