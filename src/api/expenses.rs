//! Expense endpoint handlers.

use super::{auth::UserId, ApiError, AppState, MessageResponse};
use crate::expenses::{CreatedExpense, ExpenseAnalytics, ExpenseInput, ExpenseList, ListFilter};
use crate::rates::RateTable;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// POST /api/expenses
pub async fn create(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    payload: Result<Json<ExpenseInput>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedExpense>), ApiError> {
    let Json(input) = payload?;
    // Runs as its own task so a dropped request cannot stop the pipeline
    // between saving the expense and attaching its suggestion.
    let expenses = Arc::clone(&state.expenses);
    let created = tokio::spawn(
        async move { expenses.create_expense(&user_id, &input).await }.in_current_span(),
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "create expense task failed");
        ApiError::internal("Failed to create expense")
    })??;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/expenses
pub async fn list(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    filter: Result<Query<ListFilter>, QueryRejection>,
) -> Result<Json<ExpenseList>, ApiError> {
    let Query(filter) = filter?;
    Ok(Json(state.expenses.list_expenses(&user_id, &filter).await?))
}

/// PUT /api/expenses/:id
pub async fn update(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ExpenseInput>, JsonRejection>,
) -> Result<Json<MessageResponse<crate::domain::Expense>>, ApiError> {
    let Path(id) = id?;
    let Json(input) = payload?;
    let expense = state.expenses.update_expense(&user_id, id, &input).await?;
    Ok(Json(MessageResponse {
        message: "Expense updated successfully".to_string(),
        expense: Some(expense),
    }))
}

/// DELETE /api/expenses/:id
pub async fn delete(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MessageResponse<crate::domain::Expense>>, ApiError> {
    let Path(id) = id?;
    state.expenses.delete_expense(&user_id, id).await?;
    Ok(Json(MessageResponse {
        message: "Expense deleted successfully".to_string(),
        expense: None,
    }))
}

/// GET /api/expenses/analytics
pub async fn analytics(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
) -> Result<Json<ExpenseAnalytics>, ApiError> {
    Ok(Json(state.expenses.analytics(&user_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct RatesQuery {
    pub base: Option<String>,
}

/// GET /api/expenses/currency-rates?base=EUR
pub async fn currency_rates(
    State(state): State<Arc<AppState>>,
    UserId(_): UserId,
    query: Result<Query<RatesQuery>, QueryRejection>,
) -> Result<Json<RateTable>, ApiError> {
    let Query(query) = query?;
    Ok(Json(
        state.expenses.currency_rates(query.base.as_deref()).await?,
    ))
}
