//! Error types for the expense workflow.

use crate::rates::RateError;
use crate::store::StoreError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ExpenseError {
    /// Bad input, reported before any side effect.
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("invalid category: {0}")]
    InvalidCategory(String),

    #[error("invalid currency: {0}")]
    InvalidCurrency(String),

    /// The expense does not exist or belongs to another user.
    #[error("expense not found: {0}")]
    NotFound(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Rates(#[from] RateError),
}

impl ExpenseError {
    pub(crate) fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
