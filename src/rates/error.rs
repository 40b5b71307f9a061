//! Error types for currency conversion.

use crate::domain::Currency;
use thiserror::Error;

/// Failure talking to the exchange rate provider.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Network connectivity error (DNS, connection refused, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded deadline.
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// Provider returned an error response (4xx, 5xx).
    #[error("Provider error {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Provider response doesn't match the expected format.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Errors surfaced by the exchange rate cache.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RateError {
    #[error("unsupported currency '{0}'")]
    InvalidCurrency(String),

    #[error("exchange rate unavailable for {currency}: {source}")]
    Unavailable {
        currency: Currency,
        #[source]
        source: ProviderError,
    },
}
