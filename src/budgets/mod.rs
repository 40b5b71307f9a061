//! Monthly budget limits.

use crate::clock::Clock;
use crate::domain::Budget;
use crate::store::{BudgetStore, StoreError};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BudgetError {
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BudgetError {
    fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Body of a set-budget request. `month` is zero-based.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetInput {
    pub month: Option<i64>,
    pub year: Option<i64>,
    pub amount: Option<f64>,
}

/// A validated `(month, year)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetPeriod {
    pub month: u8,
    pub year: i32,
}

impl BudgetPeriod {
    pub fn parse(month: Option<i64>, year: Option<i64>) -> Result<Self, BudgetError> {
        let month = month.ok_or_else(|| BudgetError::validation("month", "month is required"))?;
        let month = u8::try_from(month)
            .ok()
            .filter(|m| *m <= 11)
            .ok_or_else(|| BudgetError::validation("month", "month must be between 0 and 11"))?;
        let year = year.ok_or_else(|| BudgetError::validation("year", "year is required"))?;
        let year = i32::try_from(year)
            .ok()
            .filter(|y| (1970..=9999).contains(y))
            .ok_or_else(|| BudgetError::validation("year", "year must be between 1970 and 9999"))?;
        Ok(Self { month, year })
    }
}

pub struct BudgetService {
    store: Arc<dyn BudgetStore>,
    clock: Arc<dyn Clock>,
}

impl BudgetService {
    pub fn new(store: Arc<dyn BudgetStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Create or overwrite the user's budget for one month.
    pub async fn set_budget(&self, user_id: &str, input: &BudgetInput) -> Result<Budget, BudgetError> {
        let period = BudgetPeriod::parse(input.month, input.year)?;
        let amount = match input.amount {
            Some(a) if a.is_finite() && a >= 0.0 => a,
            Some(_) => {
                return Err(BudgetError::validation(
                    "amount",
                    "amount must be a non-negative number",
                ))
            }
            None => return Err(BudgetError::validation("amount", "amount is required")),
        };

        let budget = self
            .store
            .upsert_budget(user_id, period.month, period.year, amount, self.clock.now())
            .await?;
        tracing::info!(
            user_id,
            month = period.month,
            year = period.year,
            amount,
            "budget set"
        );
        Ok(budget)
    }

    pub async fn get_budget(
        &self,
        user_id: &str,
        period: BudgetPeriod,
    ) -> Result<Option<Budget>, BudgetError> {
        Ok(self
            .store
            .find_budget(user_id, period.month, period.year)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;

    fn service() -> (BudgetService, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::default());
        (
            BudgetService::new(store.clone(), clock.clone()),
            store,
            clock,
        )
    }

    fn input(month: i64, year: i64, amount: f64) -> BudgetInput {
        BudgetInput {
            month: Some(month),
            year: Some(year),
            amount: Some(amount),
        }
    }

    #[tokio::test]
    async fn test_set_twice_keeps_one_record() {
        let (service, store, clock) = service();

        let first = service.set_budget("u1", &input(3, 2024, 500.0)).await.unwrap();
        clock.advance(chrono::Duration::minutes(5));
        let second = service.set_budget("u1", &input(3, 2024, 750.0)).await.unwrap();

        assert_eq!(store.budget_count(), 1);
        assert_eq!(first.id, second.id);
        assert_eq!(second.amount, 750.0);
        assert!(second.updated_at > first.updated_at);

        let found = service
            .get_budget("u1", BudgetPeriod { month: 3, year: 2024 })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.amount, 750.0);
    }

    #[tokio::test]
    async fn test_budgets_are_per_user_and_month() {
        let (service, store, _) = service();
        service.set_budget("u1", &input(0, 2024, 1.0)).await.unwrap();
        service.set_budget("u1", &input(1, 2024, 1.0)).await.unwrap();
        service.set_budget("u2", &input(0, 2024, 1.0)).await.unwrap();
        assert_eq!(store.budget_count(), 3);
    }

    #[tokio::test]
    async fn test_rejects_bad_input() {
        let (service, store, _) = service();
        for (bad, field) in [
            (input(12, 2024, 1.0), "month"),
            (input(-1, 2024, 1.0), "month"),
            (input(0, 2024, -1.0), "amount"),
            (input(0, 20_000, 1.0), "year"),
            (BudgetInput::default(), "month"),
        ] {
            match service.set_budget("u1", &bad).await {
                Err(BudgetError::Validation { field: f, .. }) => assert_eq!(f, field),
                other => panic!("expected validation error, got {other:?}"),
            }
        }
        assert_eq!(store.budget_count(), 0);
    }

    #[tokio::test]
    async fn test_zero_amount_allowed() {
        let (service, _, _) = service();
        let budget = service.set_budget("u1", &input(11, 2024, 0.0)).await.unwrap();
        assert_eq!(budget.month, 11);
        assert_eq!(budget.amount, 0.0);
    }

    #[tokio::test]
    async fn test_missing_budget_is_none() {
        let (service, _, _) = service();
        let found = service
            .get_budget("u1", BudgetPeriod { month: 0, year: 2024 })
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
