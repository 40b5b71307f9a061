//! Budget endpoint handlers.

use super::{auth::UserId, ApiError, AppState};
use crate::budgets::{BudgetInput, BudgetPeriod};
use crate::domain::Budget;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

/// POST /api/budget/set
pub async fn set(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    payload: Result<Json<BudgetInput>, JsonRejection>,
) -> Result<Json<Budget>, ApiError> {
    let Json(input) = payload?;
    Ok(Json(state.budgets.set_budget(&user_id, &input).await?))
}

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub month: Option<i64>,
    pub year: Option<i64>,
}

/// GET /api/budget?month=&year=
///
/// Responds with `null` when no budget is set for the month.
pub async fn get(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    query: Result<Query<PeriodQuery>, QueryRejection>,
) -> Result<Json<Option<Budget>>, ApiError> {
    let Query(query) = query?;
    let period = BudgetPeriod::parse(query.month, query.year)?;
    Ok(Json(state.budgets.get_budget(&user_id, period).await?))
}
