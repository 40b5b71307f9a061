//! Wire types shared by the handlers.

use crate::budgets::BudgetError;
use crate::domain::{Category, Currency};
use crate::expenses::ExpenseError;
use crate::rates::RateError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Error envelope: `{"error": {"message", "code", "details"?}}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiErrorBody {
    pub message: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    fn new(code: &str, message: impl Into<String>, details: Option<serde_json::Value>) -> Self {
        Self {
            error: ApiErrorBody {
                message: message.into(),
                code: code.to_string(),
                details,
            },
        }
    }

    /// Malformed or invalid input (400).
    pub fn validation(field: &str, message: &str) -> Self {
        Self::new(
            "validation_error",
            format!("Invalid {}: {}", field, message),
            Some(json!({ "field": field })),
        )
    }

    /// Body or query string that could not be parsed at all (400).
    pub fn bad_request(message: &str) -> Self {
        Self::new("bad_request", message, None)
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::new("unauthorized", message, None)
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("not_found", message, None)
    }

    /// Exchange rates could not be fetched (500).
    pub fn exchange_rate_unavailable(message: &str) -> Self {
        Self::new("exchange_rate_unavailable", message, None)
    }

    pub fn internal(message: &str) -> Self {
        Self::new("internal_error", message, None)
    }

    fn status_code(&self) -> StatusCode {
        match self.error.code.as_str() {
            "validation_error" | "bad_request" | "invalid_category" | "invalid_currency" => {
                StatusCode::BAD_REQUEST
            }
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "not_found" => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

fn invalid_category(value: &str) -> ApiError {
    let allowed: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
    ApiError::new(
        "invalid_category",
        format!("Invalid category '{}'", value),
        Some(json!({ "field": "category", "allowed": allowed })),
    )
}

fn invalid_currency(value: &str) -> ApiError {
    let allowed: Vec<&str> = Currency::ALL.iter().map(Currency::code).collect();
    ApiError::new(
        "invalid_currency",
        format!("Invalid currency '{}'", value),
        Some(json!({ "field": "currency", "allowed": allowed })),
    )
}

impl From<RateError> for ApiError {
    fn from(err: RateError) -> Self {
        match err {
            RateError::InvalidCurrency(code) => invalid_currency(&code),
            unavailable @ RateError::Unavailable { .. } => {
                tracing::warn!(error = %unavailable, "exchange rate request failed");
                ApiError::exchange_rate_unavailable(&format!(
                    "Failed to fetch exchange rates: {}",
                    unavailable
                ))
            }
        }
    }
}

impl From<ExpenseError> for ApiError {
    fn from(err: ExpenseError) -> Self {
        match err {
            ExpenseError::Validation { field, message } => ApiError::validation(&field, &message),
            ExpenseError::InvalidCategory(value) => invalid_category(&value),
            ExpenseError::InvalidCurrency(value) => invalid_currency(&value),
            ExpenseError::NotFound(_) => ApiError::not_found("Expense not found"),
            ExpenseError::Rates(e) => e.into(),
            ExpenseError::Store(e) => {
                tracing::error!(error = %e, "store operation failed");
                ApiError::internal("Server error")
            }
        }
    }
}

impl From<BudgetError> for ApiError {
    fn from(err: BudgetError) -> Self {
        match err {
            BudgetError::Validation { field, message } => ApiError::validation(&field, &message),
            BudgetError::Store(e) => {
                tracing::error!(error = %e, "store operation failed");
                ApiError::internal("Server error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(&rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(&rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request(&rejection.body_text())
    }
}

/// Plain acknowledgement, optionally carrying the affected expense.
#[derive(Debug, Serialize)]
pub struct MessageResponse<T: Serialize> {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expense: Option<T>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Currency;
    use crate::rates::ProviderError;
    use crate::store::StoreError;
    use uuid::Uuid;

    #[test]
    fn test_expense_error_statuses() {
        let cases = [
            (
                ExpenseError::Validation {
                    field: "amount".into(),
                    message: "must be positive".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                ExpenseError::InvalidCategory("pets".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ExpenseError::InvalidCurrency("XYZ".into()),
                StatusCode::BAD_REQUEST,
            ),
            (ExpenseError::NotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (
                ExpenseError::Store(StoreError::Unavailable("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ExpenseError::Rates(RateError::Unavailable {
                    currency: Currency::Eur,
                    source: ProviderError::Timeout(10),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_rate_outage_is_descriptive_server_error() {
        let err = ApiError::from(RateError::Unavailable {
            currency: Currency::Gbp,
            source: ProviderError::Network("connection refused".into()),
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error.code, "exchange_rate_unavailable");
        assert!(err.error.message.contains("GBP"));
        assert!(err.error.message.contains("connection refused"));
    }

    #[test]
    fn test_validation_names_field() {
        let err = ApiError::from(ExpenseError::Validation {
            field: "amount".into(),
            message: "amount is required".into(),
        });
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["error"]["code"], "validation_error");
        assert_eq!(json["error"]["details"]["field"], "amount");
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("amount is required"));
    }

    #[test]
    fn test_invalid_category_lists_allowed_values() {
        let json = serde_json::to_value(ApiError::from(ExpenseError::InvalidCategory(
            "pets".into(),
        )))
        .unwrap();
        let allowed = json["error"]["details"]["allowed"].as_array().unwrap();
        assert_eq!(allowed.len(), 10);
        assert!(allowed.contains(&json!("food")));
    }

    #[test]
    fn test_details_omitted_when_empty() {
        let json = serde_json::to_value(ApiError::not_found("Expense not found")).unwrap();
        assert!(json["error"].get("details").is_none());
    }
}
