//! In-process store backed by concurrent maps.

use super::{
    BudgetStore, CategoryStat, ExpenseQuery, ExpenseStore, MonthlyStat, Page, StoreError,
};
use crate::domain::{Budget, Category, Expense, ExpensePatch};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use uuid::Uuid;

type BudgetKey = (String, u8, i32);

/// Thread-safe in-memory document store.
#[derive(Default)]
pub struct MemoryStore {
    expenses: DashMap<Uuid, Expense>,
    budgets: DashMap<BudgetKey, Budget>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expense_count(&self) -> usize {
        self.expenses.len()
    }

    pub fn budget_count(&self) -> usize {
        self.budgets.len()
    }

    fn matching(&self, query: &ExpenseQuery) -> Vec<Expense> {
        self.expenses
            .iter()
            .filter(|entry| query.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }
}

#[async_trait]
impl ExpenseStore for MemoryStore {
    async fn insert(&self, expense: Expense) -> Result<Expense, StoreError> {
        self.expenses.insert(expense.id, expense.clone());
        Ok(expense)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Expense>, StoreError> {
        Ok(self.expenses.get(&id).map(|e| e.value().clone()))
    }

    async fn find(
        &self,
        query: &ExpenseQuery,
        page: Option<Page>,
    ) -> Result<Vec<Expense>, StoreError> {
        let mut found = self.matching(query);
        found.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));

        Ok(match page {
            Some(page) => found
                .into_iter()
                .skip(page.skip())
                .take(page.limit as usize)
                .collect(),
            None => found,
        })
    }

    async fn count(&self, query: &ExpenseQuery) -> Result<u64, StoreError> {
        Ok(self
            .expenses
            .iter()
            .filter(|entry| query.matches(entry.value()))
            .count() as u64)
    }

    async fn update_owned(
        &self,
        id: Uuid,
        user_id: &str,
        patch: &ExpensePatch,
    ) -> Result<Option<Expense>, StoreError> {
        match self.expenses.get_mut(&id) {
            Some(mut entry) if entry.user_id == user_id => {
                patch.apply(entry.value_mut());
                Ok(Some(entry.value().clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_owned(&self, id: Uuid, user_id: &str) -> Result<Option<Expense>, StoreError> {
        Ok(self
            .expenses
            .remove_if(&id, |_, e| e.user_id == user_id)
            .map(|(_, e)| e))
    }

    async fn set_suggestion(&self, id: Uuid, suggestion: &str) -> Result<Expense, StoreError> {
        let mut entry = self
            .expenses
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        entry.budget_suggestion = suggestion.to_string();
        Ok(entry.value().clone())
    }

    async fn latest_suggestion_before(
        &self,
        user_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<String>, StoreError> {
        Ok(self
            .expenses
            .iter()
            .filter(|e| {
                e.user_id == user_id
                    && e.created_at <= cutoff
                    && !e.budget_suggestion.trim().is_empty()
            })
            .max_by_key(|e| e.created_at)
            .map(|e| e.budget_suggestion.clone()))
    }

    async fn category_stats(&self, user_id: &str) -> Result<Vec<CategoryStat>, StoreError> {
        let mut grouped: HashMap<Category, (f64, u64)> = HashMap::new();
        for expense in self.matching(&ExpenseQuery::for_user(user_id)) {
            let slot = grouped.entry(expense.category).or_default();
            slot.0 += expense.amount;
            slot.1 += 1;
        }

        let mut stats: Vec<CategoryStat> = grouped
            .into_iter()
            .map(|(category, (total, count))| CategoryStat {
                category,
                total,
                count,
            })
            .collect();
        stats.sort_by(|a, b| b.total.total_cmp(&a.total).then(a.category.cmp(&b.category)));
        Ok(stats)
    }

    async fn monthly_stats(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<MonthlyStat>, StoreError> {
        let mut grouped: HashMap<(i32, u32), (f64, u64)> = HashMap::new();
        for expense in self.matching(&ExpenseQuery::for_user(user_id)) {
            let slot = grouped
                .entry((expense.date.year(), expense.date.month()))
                .or_default();
            slot.0 += expense.amount;
            slot.1 += 1;
        }

        let mut stats: Vec<MonthlyStat> = grouped
            .into_iter()
            .map(|((year, month), (total, count))| MonthlyStat {
                year,
                month,
                total,
                count,
            })
            .collect();
        stats.sort_by(|a, b| (b.year, b.month).cmp(&(a.year, a.month)));
        stats.truncate(limit);
        Ok(stats)
    }
}

#[async_trait]
impl BudgetStore for MemoryStore {
    async fn upsert_budget(
        &self,
        user_id: &str,
        month: u8,
        year: i32,
        amount: f64,
        now: DateTime<Utc>,
    ) -> Result<Budget, StoreError> {
        let key = (user_id.to_string(), month, year);
        let mut entry = self.budgets.entry(key).or_insert_with(|| Budget {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            month,
            year,
            amount,
            created_at: now,
            updated_at: now,
        });
        entry.amount = amount;
        entry.updated_at = now;
        Ok(entry.value().clone())
    }

    async fn find_budget(
        &self,
        user_id: &str,
        month: u8,
        year: i32,
    ) -> Result<Option<Budget>, StoreError> {
        Ok(self
            .budgets
            .get(&(user_id.to_string(), month, year))
            .map(|b| b.value().clone()))
    }
}
