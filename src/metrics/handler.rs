//! # Metrics HTTP Handlers

use crate::api::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

/// Handler for GET /metrics endpoint (Prometheus text format).
///
/// Always 200, even before any metric has been recorded.
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state
        .metrics_collector
        .update_cache_gauges(&state.rates, &state.suggestions);

    let metrics = state.metrics_collector.render_metrics();
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        metrics,
    )
}
