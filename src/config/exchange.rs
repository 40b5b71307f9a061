//! Exchange rate provider configuration

use serde::{Deserialize, Serialize};

/// Settings for the upstream currency-rate API and its cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Base URL; rate tables are fetched from `{base_url}/v4/latest/{CODE}`
    pub base_url: String,
    /// Name of the environment variable holding the API key (optional)
    pub api_key_env: Option<String>,
    /// How long a fetched rate stays valid
    pub rate_ttl_seconds: u64,
    /// Minimum spacing between upstream requests, process-wide
    pub min_interval_ms: u64,
    /// Upstream attempts per cache miss (first try included)
    pub fetch_attempts: u32,
    pub timeout_seconds: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.exchangerate-api.com".to_string(),
            api_key_env: Some("EXCHANGERATE_API_KEY".to_string()),
            rate_ttl_seconds: 24 * 60 * 60,
            min_interval_ms: 4_000,
            fetch_attempts: 2,
            timeout_seconds: 10,
        }
    }
}
