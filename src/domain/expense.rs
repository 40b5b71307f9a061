//! Expense records.

use super::{Category, Currency};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single recorded expense, owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: Uuid,
    pub user_id: String,
    pub amount: f64,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub currency: Currency,
    /// AI budget advice attached after creation; empty until then.
    #[serde(default)]
    pub budget_suggestion: String,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    pub fn line(&self) -> ExpenseLine {
        ExpenseLine {
            category: self.category,
            amount: self.amount,
            currency: self.currency,
        }
    }
}

/// The part of an expense that drives budget advice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpenseLine {
    pub category: Category,
    pub amount: f64,
    pub currency: Currency,
}

/// Validated partial update for an existing expense.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpensePatch {
    pub amount: Option<f64>,
    pub category: Option<Category>,
    pub description: Option<String>,
    pub currency: Option<Currency>,
    pub date: Option<DateTime<Utc>>,
}

impl ExpensePatch {
    pub fn apply(&self, expense: &mut Expense) {
        if let Some(amount) = self.amount {
            expense.amount = amount;
        }
        if let Some(category) = self.category {
            expense.category = category;
        }
        if let Some(description) = &self.description {
            expense.description = Some(description.clone());
        }
        if let Some(currency) = self.currency {
            expense.currency = currency;
        }
        if let Some(date) = self.date {
            expense.date = date;
        }
    }
}
