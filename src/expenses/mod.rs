//! Expense workflows.
//!
//! [`ExpenseService::create_expense`] is the main pipeline: validate, persist,
//! normalize the user's spending to USD, ask the [`SuggestionEngine`] for
//! advice, degrade to a stale or generic suggestion when that fails, check
//! the advice mentions every category, then attach it to the new expense.

mod error;
mod input;

pub use error::ExpenseError;
pub use input::{AmountInput, ExpenseInput, ListFilter, NewExpense, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

use crate::advisor::SuggestionEngine;
use crate::clock::Clock;
use crate::config::ExpensesConfig;
use crate::domain::{Category, Currency, Expense, ExpenseLine, UnknownCurrency};
use crate::logging::generate_request_id;
use crate::rates::{ExchangeRateCache, RateTable, UsdRates};
use crate::store::{CategoryStat, ExpenseQuery, ExpenseStore, MonthlyStat};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Months of history returned by [`ExpenseService::analytics`].
pub const ANALYTICS_MONTHS: usize = 12;

/// Result of a successful create.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedExpense {
    pub expense: Expense,
    pub ai_suggestion: String,
    /// USD totals per category, formatted with two decimals.
    pub category_totals: BTreeMap<Category, String>,
    pub budget_ceiling: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseList {
    pub expenses: Vec<Expense>,
    pub total_pages: u64,
    pub current_page: u32,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseAnalytics {
    pub category_stats: Vec<CategoryStat>,
    pub monthly_stats: Vec<MonthlyStat>,
}

/// Per-category and overall USD spend.
#[derive(Debug, Clone, Default, PartialEq)]
struct SpendingTotals {
    total: f64,
    by_category: BTreeMap<Category, f64>,
}

pub struct ExpenseService {
    store: Arc<dyn ExpenseStore>,
    rates: Arc<ExchangeRateCache>,
    advisor: Arc<SuggestionEngine>,
    clock: Arc<dyn Clock>,
    config: ExpensesConfig,
}

impl ExpenseService {
    pub fn new(
        store: Arc<dyn ExpenseStore>,
        rates: Arc<ExchangeRateCache>,
        advisor: Arc<SuggestionEngine>,
        clock: Arc<dyn Clock>,
        config: ExpensesConfig,
    ) -> Self {
        Self {
            store,
            rates,
            advisor,
            clock,
            config,
        }
    }

    /// Record an expense and attach budget advice to it.
    ///
    /// Once validation passes this only fails if the first write fails.
    /// Advice and conversion problems degrade the suggestion text instead.
    pub async fn create_expense(
        &self,
        user_id: &str,
        input: &ExpenseInput,
    ) -> Result<CreatedExpense, ExpenseError> {
        let request_id = generate_request_id();
        let span = tracing::info_span!("create_expense", request_id = %request_id, user_id);
        self.create_expense_inner(user_id, input)
            .instrument(span)
            .await
    }

    async fn create_expense_inner(
        &self,
        user_id: &str,
        input: &ExpenseInput,
    ) -> Result<CreatedExpense, ExpenseError> {
        let valid = input.validate_new()?;

        let now = self.clock.now();
        let expense = Expense {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            amount: valid.amount,
            category: valid.category,
            description: valid.description,
            currency: valid.currency,
            budget_suggestion: String::new(),
            date: valid.date.unwrap_or(now),
            created_at: now,
        };
        let expense = self.store.insert(expense).await?;
        tracing::info!(
            expense_id = %expense.id,
            amount = expense.amount,
            currency = %expense.currency,
            category = %expense.category,
            "expense saved"
        );

        let lines: Vec<ExpenseLine> = self
            .store
            .find(&ExpenseQuery::for_user(user_id), None)
            .await?
            .iter()
            .map(Expense::line)
            .collect();
        let rates = self
            .rates
            .usd_rates(lines.iter().map(|line| line.currency).collect::<Vec<_>>())
            .await;
        if rates.has_failures() {
            tracing::warn!("conversion failed for some currencies, counting them at face value");
        }
        let totals = spending_totals(&lines, &rates);
        let ceiling = (totals.total * self.config.budget_headroom).min(self.config.budget_cap_usd);

        let suggestion = match self
            .advisor
            .suggest_with_rates(&lines, &rates, ceiling, user_id)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "AI suggestion failed, using fallback");
                self.fallback_suggestion(user_id).await
            }
        };

        let categories: Vec<Category> = totals.by_category.keys().copied().collect();
        let suggestion = if mentions_all_categories(&suggestion, &categories) {
            suggestion
        } else {
            tracing::info!("suggestion does not cover every category, replacing");
            metrics::counter!("spendwise_suggestion_fallbacks_total", "reason" => "irrelevant")
                .increment(1);
            self.config.fallback_suggestion.clone()
        };

        let expense = match self.store.set_suggestion(expense.id, &suggestion).await {
            Ok(updated) => updated,
            Err(e) => {
                // The expense stays saved without a suggestion.
                tracing::error!(
                    expense_id = %expense.id,
                    error = %e,
                    "failed to attach suggestion to expense"
                );
                expense
            }
        };

        Ok(CreatedExpense {
            expense,
            ai_suggestion: suggestion,
            category_totals: totals
                .by_category
                .iter()
                .map(|(category, total)| (*category, format!("{:.2}", total)))
                .collect(),
            budget_ceiling: ceiling,
        })
    }

    /// Newest suggestion older than the stale age, else the generic text.
    async fn fallback_suggestion(&self, user_id: &str) -> String {
        let cutoff = self.clock.now()
            - chrono::Duration::seconds(self.config.stale_suggestion_age_seconds as i64);
        match self.store.latest_suggestion_before(user_id, cutoff).await {
            Ok(Some(text)) => {
                metrics::counter!("spendwise_suggestion_fallbacks_total", "reason" => "stale")
                    .increment(1);
                tracing::info!("reusing earlier suggestion");
                text
            }
            Ok(None) => {
                metrics::counter!("spendwise_suggestion_fallbacks_total", "reason" => "generic")
                    .increment(1);
                self.config.fallback_suggestion.clone()
            }
            Err(e) => {
                tracing::warn!(error = %e, "stale suggestion lookup failed");
                metrics::counter!("spendwise_suggestion_fallbacks_total", "reason" => "generic")
                    .increment(1);
                self.config.fallback_suggestion.clone()
            }
        }
    }

    pub async fn list_expenses(
        &self,
        user_id: &str,
        filter: &ListFilter,
    ) -> Result<ExpenseList, ExpenseError> {
        let (query, page) = filter.validate(user_id)?;
        let total = self.store.count(&query).await?;
        let expenses = self.store.find(&query, Some(page)).await?;
        Ok(ExpenseList {
            expenses,
            total_pages: total.div_ceil(page.limit as u64),
            current_page: page.page,
            total,
        })
    }

    pub async fn get_expense(&self, user_id: &str, id: Uuid) -> Result<Expense, ExpenseError> {
        match self.store.find_by_id(id).await? {
            Some(expense) if expense.user_id == user_id => Ok(expense),
            _ => Err(ExpenseError::NotFound(id)),
        }
    }

    pub async fn update_expense(
        &self,
        user_id: &str,
        id: Uuid,
        input: &ExpenseInput,
    ) -> Result<Expense, ExpenseError> {
        let patch = input.validate_patch()?;
        let updated = self
            .store
            .update_owned(id, user_id, &patch)
            .await?
            .ok_or(ExpenseError::NotFound(id))?;
        tracing::info!(expense_id = %id, user_id, "expense updated");
        Ok(updated)
    }

    pub async fn delete_expense(&self, user_id: &str, id: Uuid) -> Result<Expense, ExpenseError> {
        let deleted = self
            .store
            .delete_owned(id, user_id)
            .await?
            .ok_or(ExpenseError::NotFound(id))?;
        tracing::info!(expense_id = %id, user_id, "expense deleted");
        Ok(deleted)
    }

    pub async fn analytics(&self, user_id: &str) -> Result<ExpenseAnalytics, ExpenseError> {
        Ok(ExpenseAnalytics {
            category_stats: self.store.category_stats(user_id).await?,
            monthly_stats: self.store.monthly_stats(user_id, ANALYTICS_MONTHS).await?,
        })
    }

    /// Full rate table for `base` (default USD).
    pub async fn currency_rates(&self, base: Option<&str>) -> Result<RateTable, ExpenseError> {
        let base = match base {
            Some(code) => code
                .parse()
                .map_err(|UnknownCurrency(c)| ExpenseError::InvalidCurrency(c))?,
            None => Currency::default(),
        };
        Ok(self.rates.rate_table(base).await?)
    }
}

/// USD totals for `lines`. A line whose rate could not be resolved counts at
/// face value.
fn spending_totals(lines: &[ExpenseLine], rates: &UsdRates) -> SpendingTotals {
    let mut totals = SpendingTotals::default();
    for line in lines {
        let usd = match rates.rate(line.currency) {
            Some(Ok(rate)) => line.amount * rate,
            Some(Err(e)) => {
                tracing::debug!(
                    currency = %line.currency,
                    error = %e,
                    "counting amount at face value"
                );
                line.amount
            }
            None => line.amount,
        };
        totals.total += usd;
        *totals.by_category.entry(line.category).or_insert(0.0) += usd;
    }
    totals
}

/// True when `text` names every category, ignoring case.
pub fn mentions_all_categories(text: &str, categories: &[Category]) -> bool {
    let text = text.to_lowercase();
    categories.iter().all(|c| text.contains(c.as_str()))
}
