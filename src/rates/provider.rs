//! Upstream exchange rate provider.

use super::ProviderError;
use crate::domain::Currency;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Conversion table for one base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    #[serde(default)]
    pub base: String,
    pub rates: HashMap<String, f64>,
}

impl RateTable {
    /// Units of USD per one unit of the base currency.
    pub fn usd_rate(&self) -> Option<f64> {
        self.rates
            .get(Currency::Usd.code())
            .copied()
            .filter(|r| r.is_finite() && *r > 0.0)
    }
}

/// Source of currency rate tables.
#[async_trait]
pub trait RateProvider: Send + Sync + 'static {
    async fn fetch_rates(&self, base: Currency) -> Result<RateTable, ProviderError>;
}

/// Client for exchangerate-api style endpoints: `GET {base_url}/v4/latest/{CODE}`.
pub struct HttpRateProvider {
    base_url: String,
    api_key: Option<String>,
    client: Client,
    timeout: Duration,
}

impl HttpRateProvider {
    pub fn new(base_url: String, api_key: Option<String>, client: Client, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
            timeout,
        }
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    async fn fetch_rates(&self, base: Currency) -> Result<RateTable, ProviderError> {
        let url = format!("{}/v4/latest/{}", self.base_url, base.code());

        tracing::debug!(currency = %base, "fetching exchange rates");

        let start = std::time::Instant::now();
        let mut request = self.client.get(&url).timeout(self.timeout);
        if let Some(key) = &self.api_key {
            request = request.query(&[("apiKey", key)]);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.timeout.as_millis() as u64)
            } else {
                ProviderError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::info!(
                currency = %base,
                status = %status,
                latency_ms = start.elapsed().as_millis() as u64,
                "exchange rate fetch failed"
            );
            return Err(ProviderError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let table: RateTable = response.json().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse rate table: {}", e))
        })?;

        tracing::debug!(
            currency = %base,
            latency_ms = start.elapsed().as_millis() as u64,
            rates = table.rates.len(),
            "exchange rates fetched"
        );
        Ok(table)
    }
}
