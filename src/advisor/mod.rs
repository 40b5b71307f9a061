//! AI budget suggestions.
//!
//! [`SuggestionEngine::suggest`] turns a user's expense lines into three
//! budget tips. Results are cached by content; generation walks an ordered
//! list of model tiers, each with its own [`RetryPolicy`]. Only rate-limit and
//! unavailability failures are retried or fall through to the next tier.

mod cache;
mod error;
mod gemini;
mod model;
mod prompt;
mod retry;

pub use cache::SuggestionCache;
pub use error::{AdvisorError, ModelError, ModelErrorKind};
pub use gemini::GeminiModel;
pub use model::TextModel;
pub use prompt::{build_prompt, cache_key, format_summary, round_budget};
pub use retry::RetryPolicy;

use crate::domain::{Category, ExpenseLine};
use crate::rates::{ExchangeRateCache, UsdRates};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A model together with the retry budget it gets before falling through.
#[derive(Clone)]
pub struct ModelTier {
    pub model: Arc<dyn TextModel>,
    pub retry: RetryPolicy,
}

impl ModelTier {
    pub fn new(model: Arc<dyn TextModel>, retry: RetryPolicy) -> Self {
        Self { model, retry }
    }
}

pub struct SuggestionEngine {
    tiers: Vec<ModelTier>,
    rates: Arc<ExchangeRateCache>,
    cache: Arc<SuggestionCache>,
    log_prompts: bool,
}

impl SuggestionEngine {
    pub fn new(
        tiers: Vec<ModelTier>,
        rates: Arc<ExchangeRateCache>,
        cache: Arc<SuggestionCache>,
    ) -> Self {
        Self {
            tiers,
            rates,
            cache,
            log_prompts: false,
        }
    }

    /// Log full prompt text at debug level.
    pub fn with_prompt_logging(mut self, enabled: bool) -> Self {
        self.log_prompts = enabled;
        self
    }

    pub fn cache(&self) -> &Arc<SuggestionCache> {
        &self.cache
    }

    /// Budget tips for `expenses` under a `total_budget_usd` ceiling.
    pub async fn suggest(
        &self,
        expenses: &[ExpenseLine],
        total_budget_usd: f64,
        user_id: &str,
    ) -> Result<String, AdvisorError> {
        let key = cache_key(user_id, expenses);
        if let Some(text) = self.cached(&key, user_id) {
            return Ok(text);
        }

        let rates = self
            .rates
            .usd_rates(expenses.iter().map(|line| line.currency))
            .await;
        self.generate_and_cache(key, expenses, &rates, total_budget_usd, user_id)
            .await
    }

    /// Like [`SuggestionEngine::suggest`], converting with rates the caller
    /// already resolved. Currencies missing from `rates` are looked up.
    pub async fn suggest_with_rates(
        &self,
        expenses: &[ExpenseLine],
        rates: &UsdRates,
        total_budget_usd: f64,
        user_id: &str,
    ) -> Result<String, AdvisorError> {
        let key = cache_key(user_id, expenses);
        if let Some(text) = self.cached(&key, user_id) {
            return Ok(text);
        }
        self.generate_and_cache(key, expenses, rates, total_budget_usd, user_id)
            .await
    }

    fn cached(&self, key: &str, user_id: &str) -> Option<String> {
        let text = self.cache.get(key)?;
        metrics::counter!("spendwise_suggestion_cache_hits_total").increment(1);
        tracing::debug!(user_id, "suggestion cache hit");
        Some(text)
    }

    async fn generate_and_cache(
        &self,
        key: String,
        expenses: &[ExpenseLine],
        rates: &UsdRates,
        total_budget_usd: f64,
        user_id: &str,
    ) -> Result<String, AdvisorError> {
        let mut totals: BTreeMap<Category, f64> = BTreeMap::new();
        for line in expenses {
            let rate = match rates.rate(line.currency) {
                Some(rate) => rate?,
                None => self.rates.rate_for(line.currency).await?,
            };
            *totals.entry(line.category).or_insert(0.0) += line.amount * rate;
        }

        let prompt = build_prompt(round_budget(total_budget_usd), &format_summary(&totals));
        if self.log_prompts {
            tracing::debug!(user_id, prompt = %prompt, "built suggestion prompt");
        }

        let text = self.generate(&prompt).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(AdvisorError::Unavailable(
                "model returned an empty suggestion".to_string(),
            ));
        }

        self.cache.insert(key, text.to_string());
        Ok(text.to_string())
    }

    /// Walk the tiers in order until one produces text.
    async fn generate(&self, prompt: &str) -> Result<String, AdvisorError> {
        let mut last_error: Option<ModelError> = None;

        for (index, tier) in self.tiers.iter().enumerate() {
            if index > 0 {
                tracing::warn!(
                    model = tier.model.name(),
                    "falling back to next model"
                );
            }
            match self.generate_with_retry(tier, prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() => last_error = Some(e),
                Err(e) => return Err(AdvisorError::Unavailable(e.to_string())),
            }
        }

        Err(AdvisorError::Unavailable(match last_error {
            Some(e) => e.to_string(),
            None => "no models configured".to_string(),
        }))
    }

    async fn generate_with_retry(
        &self,
        tier: &ModelTier,
        prompt: &str,
    ) -> Result<String, ModelError> {
        let model = tier.model.name().to_string();
        let mut attempt = 1;
        loop {
            let start = std::time::Instant::now();
            let result = tier.model.generate(prompt).await;
            metrics::histogram!("spendwise_ai_request_duration_seconds", "model" => model.clone())
                .record(start.elapsed().as_secs_f64());

            match result {
                Ok(text) => {
                    metrics::counter!(
                        "spendwise_ai_attempts_total",
                        "model" => model.clone(),
                        "outcome" => "ok"
                    )
                    .increment(1);
                    return Ok(text);
                }
                Err(e) => {
                    metrics::counter!(
                        "spendwise_ai_attempts_total",
                        "model" => model.clone(),
                        "outcome" => e.kind.to_string()
                    )
                    .increment(1);

                    if !e.is_retryable() || attempt >= tier.retry.max_attempts {
                        tracing::warn!(
                            model = %model,
                            attempt,
                            error = %e,
                            "model attempt failed, giving up on model"
                        );
                        return Err(e);
                    }

                    let delay = tier.retry.delay_after(attempt);
                    tracing::info!(
                        model = %model,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "model attempt failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
