//! Configuration module for Spendwise
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`SPENDWISE_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use spendwise::config::SpendwiseConfig;
//!
//! let config = SpendwiseConfig::default();
//! assert_eq!(config.server.port, 5000);
//!
//! let toml = r#"
//! [server]
//! port = 9000
//! "#;
//! let config: SpendwiseConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.server.port, 9000);
//! ```

pub mod advisor;
pub mod cache;
pub mod error;
pub mod exchange;
pub mod expenses;
pub mod logging;
pub mod server;

pub use advisor::{AdvisorConfig, ModelConfig};
pub use cache::CacheConfig;
pub use error::ConfigError;
pub use exchange::ExchangeConfig;
pub use expenses::{ExpensesConfig, DEFAULT_FALLBACK_SUGGESTION};
pub use logging::{LogFormat, LoggingConfig};
pub use server::ServerConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unified configuration for the Spendwise server.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SpendwiseConfig {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Currency-rate provider and rate cache
    pub exchange: ExchangeConfig,
    /// Generative model chain and suggestion cache
    pub advisor: AdvisorConfig,
    /// Create-expense workflow tuning
    pub expenses: ExpensesConfig,
    /// Background cache maintenance
    pub cache: CacheConfig,
}

impl SpendwiseConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports SPENDWISE_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(port) = std::env::var("SPENDWISE_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(host) = std::env::var("SPENDWISE_HOST") {
            self.server.host = host;
        }

        if let Ok(level) = std::env::var("SPENDWISE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("SPENDWISE_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        if let Ok(url) = std::env::var("SPENDWISE_EXCHANGE_URL") {
            self.exchange.base_url = url;
        }
        if let Ok(url) = std::env::var("SPENDWISE_ADVISOR_URL") {
            self.advisor.base_url = url;
        }
        if let Ok(cap) = std::env::var("SPENDWISE_BUDGET_CAP_USD") {
            if let Ok(c) = cap.parse() {
                self.expenses.budget_cap_usd = c;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::invalid("server.port", "port must be non-zero"));
        }

        if self.exchange.base_url.is_empty() {
            return Err(ConfigError::invalid(
                "exchange.base_url",
                "URL cannot be empty",
            ));
        }
        if self.exchange.fetch_attempts == 0 {
            return Err(ConfigError::invalid(
                "exchange.fetch_attempts",
                "at least one attempt is required",
            ));
        }

        if self.advisor.base_url.is_empty() {
            return Err(ConfigError::invalid("advisor.base_url", "URL cannot be empty"));
        }
        if self.advisor.models.is_empty() {
            return Err(ConfigError::invalid(
                "advisor.models",
                "at least one model must be configured",
            ));
        }
        for (i, model) in self.advisor.models.iter().enumerate() {
            if model.name.is_empty() {
                return Err(ConfigError::invalid(
                    format!("advisor.models[{}].name", i),
                    "name cannot be empty",
                ));
            }
            if model.max_attempts == 0 {
                return Err(ConfigError::invalid(
                    format!("advisor.models[{}].max_attempts", i),
                    "at least one attempt is required",
                ));
            }
        }
        if self.advisor.cache_max_entries == 0 {
            return Err(ConfigError::invalid(
                "advisor.cache_max_entries",
                "must be at least 1",
            ));
        }

        if self.expenses.budget_headroom.is_nan() || self.expenses.budget_headroom < 1.0 {
            return Err(ConfigError::invalid(
                "expenses.budget_headroom",
                "must be at least 1.0",
            ));
        }
        if self.expenses.budget_cap_usd.is_nan() || self.expenses.budget_cap_usd <= 0.0 {
            return Err(ConfigError::invalid(
                "expenses.budget_cap_usd",
                "must be positive",
            ));
        }

        Ok(())
    }
}
