//! Currency normalization.
//!
//! [`ExchangeRateCache`] answers "how many USD is one unit of X" with at most
//! one live entry per currency. Entries expire `ttl` after insertion; expiry
//! is checked lazily on read and by [`ExchangeRateCache::purge_expired`].
//! Every upstream request goes through the shared [`RateLimiter`].

mod error;
mod limiter;
mod provider;

pub use error::{ProviderError, RateError};
pub use limiter::RateLimiter;
pub use provider::{HttpRateProvider, RateProvider, RateTable};

use crate::clock::Clock;
use crate::domain::{Currency, UnknownCurrency};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
struct RateEntry {
    rate_to_usd: f64,
    inserted_at: DateTime<Utc>,
}

pub struct ExchangeRateCache {
    provider: Arc<dyn RateProvider>,
    limiter: Arc<RateLimiter>,
    clock: Arc<dyn Clock>,
    entries: DashMap<Currency, RateEntry>,
    ttl: Duration,
    fetch_attempts: u32,
}

impl ExchangeRateCache {
    pub fn new(
        provider: Arc<dyn RateProvider>,
        limiter: Arc<RateLimiter>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            provider,
            limiter,
            clock,
            entries: DashMap::new(),
            ttl,
            fetch_attempts: 1,
        }
    }

    /// Upstream attempts per miss, first try included.
    pub fn with_fetch_attempts(mut self, attempts: u32) -> Self {
        self.fetch_attempts = attempts.max(1);
        self
    }

    /// Rate for an ISO code string. Unknown codes fail before any network access.
    pub async fn get_rate(&self, code: &str) -> Result<f64, RateError> {
        let currency: Currency = code
            .parse()
            .map_err(|UnknownCurrency(code)| RateError::InvalidCurrency(code))?;
        self.rate_for(currency).await
    }

    pub async fn rate_for(&self, currency: Currency) -> Result<f64, RateError> {
        if currency == Currency::Usd {
            return Ok(1.0);
        }

        if let Some(rate) = self.cached(currency) {
            metrics::counter!("spendwise_rate_cache_hits_total").increment(1);
            return Ok(rate);
        }
        metrics::counter!("spendwise_rate_cache_misses_total").increment(1);

        let mut last_error = None;
        for attempt in 1..=self.fetch_attempts {
            match self.fetch_usd_rate(currency).await {
                Ok(rate) => {
                    self.store(currency, rate);
                    tracing::info!(currency = %currency, rate, attempt, "cached exchange rate");
                    return Ok(rate);
                }
                Err(e) => {
                    tracing::warn!(
                        currency = %currency,
                        attempt,
                        max_attempts = self.fetch_attempts,
                        error = %e,
                        "exchange rate fetch failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(RateError::Unavailable {
            currency,
            source: last_error
                .unwrap_or_else(|| ProviderError::Network("no attempt made".to_string())),
        })
    }

    /// Resolve each distinct currency once.
    ///
    /// A currency that fails is remembered as failed, so the rest of the
    /// caller's work does not spend more limiter slots on it.
    pub async fn usd_rates<I>(&self, currencies: I) -> UsdRates
    where
        I: IntoIterator<Item = Currency>,
    {
        let mut rates = BTreeMap::new();
        for currency in currencies {
            if rates.contains_key(&currency) {
                continue;
            }
            let rate = self.rate_for(currency).await;
            rates.insert(currency, rate);
        }
        UsdRates { rates }
    }

    /// Convert `amount` of `currency` into USD.
    pub async fn to_usd(&self, amount: f64, currency: Currency) -> Result<f64, RateError> {
        Ok(amount * self.rate_for(currency).await?)
    }

    /// Full rate table for `base`, fetched once through the limiter.
    ///
    /// The USD rate it carries refreshes the cache entry for `base`.
    pub async fn rate_table(&self, base: Currency) -> Result<RateTable, RateError> {
        let table = self
            .limiter
            .schedule(|| self.provider.fetch_rates(base))
            .await
            .map_err(|source| {
                metrics::counter!("spendwise_rate_fetches_total", "outcome" => "error")
                    .increment(1);
                RateError::Unavailable {
                    currency: base,
                    source,
                }
            })?;
        metrics::counter!("spendwise_rate_fetches_total", "outcome" => "ok").increment(1);

        if base != Currency::Usd {
            if let Some(rate) = table.usd_rate() {
                self.store(base, rate);
            }
        }
        Ok(table)
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now - entry.inserted_at < self.ttl);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn cached(&self, currency: Currency) -> Option<f64> {
        let now = self.clock.now();
        let entry = *self.entries.get(&currency)?;
        if now - entry.inserted_at < self.ttl {
            Some(entry.rate_to_usd)
        } else {
            self.entries
                .remove_if(&currency, |_, e| e.inserted_at == entry.inserted_at);
            None
        }
    }

    fn store(&self, currency: Currency, rate_to_usd: f64) {
        self.entries.insert(
            currency,
            RateEntry {
                rate_to_usd,
                inserted_at: self.clock.now(),
            },
        );
    }

    async fn fetch_usd_rate(&self, currency: Currency) -> Result<f64, ProviderError> {
        let result = self
            .limiter
            .schedule(|| self.provider.fetch_rates(currency))
            .await
            .and_then(|table| {
                table.usd_rate().ok_or_else(|| {
                    ProviderError::InvalidResponse(format!(
                        "rate table for {} has no usable USD rate",
                        currency
                    ))
                })
            });

        let outcome = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!("spendwise_rate_fetches_total", "outcome" => outcome).increment(1);
        result
    }
}

/// USD rates resolved for one unit of work.
#[derive(Debug, Clone, Default)]
pub struct UsdRates {
    rates: BTreeMap<Currency, Result<f64, RateError>>,
}

impl UsdRates {
    /// `None` when `currency` was not part of the resolved set.
    pub fn rate(&self, currency: Currency) -> Option<Result<f64, RateError>> {
        self.rates.get(&currency).cloned()
    }

    pub fn has_failures(&self) -> bool {
        self.rates.values().any(Result::is_err)
    }
}
