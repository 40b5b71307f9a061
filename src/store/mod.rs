//! Document store interface.
//!
//! The service only needs per-document atomicity: every operation here
//! touches a single expense or budget record, and nothing relies on
//! cross-document transactions. [`MemoryStore`] is the bundled backend.

mod error;
mod memory;

pub use error::StoreError;
pub use memory::MemoryStore;

use crate::domain::{Budget, Category, Expense, ExpensePatch};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Filter for expense lookups. Always scoped to one user.
#[derive(Debug, Clone, Default)]
pub struct ExpenseQuery {
    pub user_id: String,
    pub category: Option<Category>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl ExpenseQuery {
    pub fn for_user(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            ..Default::default()
        }
    }

    pub fn matches(&self, expense: &Expense) -> bool {
        expense.user_id == self.user_id
            && self.category.is_none_or(|c| c == expense.category)
            && self.start.is_none_or(|s| expense.date >= s)
            && self.end.is_none_or(|e| expense.date <= e)
    }
}

/// One-based page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub fn skip(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.limit as usize
    }
}

/// Spending grouped by category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStat {
    pub category: Category,
    pub total: f64,
    pub count: u64,
}

/// Spending grouped by calendar month. `month` is 1-based here.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStat {
    pub year: i32,
    pub month: u32,
    pub total: f64,
    pub count: u64,
}

#[async_trait]
pub trait ExpenseStore: Send + Sync + 'static {
    async fn insert(&self, expense: Expense) -> Result<Expense, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Expense>, StoreError>;

    /// Matching expenses, newest `date` first.
    async fn find(
        &self,
        query: &ExpenseQuery,
        page: Option<Page>,
    ) -> Result<Vec<Expense>, StoreError>;

    async fn count(&self, query: &ExpenseQuery) -> Result<u64, StoreError>;

    /// Apply `patch` to the expense only if `user_id` owns it.
    async fn update_owned(
        &self,
        id: Uuid,
        user_id: &str,
        patch: &ExpensePatch,
    ) -> Result<Option<Expense>, StoreError>;

    /// Remove the expense only if `user_id` owns it.
    async fn delete_owned(&self, id: Uuid, user_id: &str) -> Result<Option<Expense>, StoreError>;

    async fn set_suggestion(&self, id: Uuid, suggestion: &str) -> Result<Expense, StoreError>;

    /// Suggestion text of the user's newest expense created at or before
    /// `cutoff` whose suggestion is non-empty.
    async fn latest_suggestion_before(
        &self,
        user_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<String>, StoreError>;

    /// Totals per category, largest first.
    async fn category_stats(&self, user_id: &str) -> Result<Vec<CategoryStat>, StoreError>;

    /// Totals per month, newest first, at most `limit` months.
    async fn monthly_stats(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<MonthlyStat>, StoreError>;
}

#[async_trait]
pub trait BudgetStore: Send + Sync + 'static {
    /// Insert or overwrite the budget for `(user_id, month, year)`.
    async fn upsert_budget(
        &self,
        user_id: &str,
        month: u8,
        year: i32,
        amount: f64,
        now: DateTime<Utc>,
    ) -> Result<Budget, StoreError>;

    async fn find_budget(
        &self,
        user_id: &str,
        month: u8,
        year: i32,
    ) -> Result<Option<Budget>, StoreError>;
}
