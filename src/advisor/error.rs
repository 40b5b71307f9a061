//! Error types for suggestion generation.

use crate::rates::RateError;
use std::fmt;
use thiserror::Error;

/// How a model failure should be treated by the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelErrorKind {
    /// Quota exhausted (HTTP 429). Retry after backing off.
    RateLimited,
    /// Service temporarily unavailable (HTTP 503, timeouts). Retry after backing off.
    Unavailable,
    /// Anything else. Never retried.
    Fatal,
}

impl fmt::Display for ModelErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModelErrorKind::RateLimited => "rate limited",
            ModelErrorKind::Unavailable => "unavailable",
            ModelErrorKind::Fatal => "fatal",
        })
    }
}

/// A failed call to a generative model, tagged with a machine-readable kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("model {model} failed ({kind}): {message}")]
pub struct ModelError {
    pub kind: ModelErrorKind,
    pub model: String,
    pub message: String,
}

impl ModelError {
    pub fn new(kind: ModelErrorKind, model: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            model: model.to_string(),
            message: message.into(),
        }
    }

    pub fn rate_limited(model: &str, message: impl Into<String>) -> Self {
        Self::new(ModelErrorKind::RateLimited, model, message)
    }

    pub fn unavailable(model: &str, message: impl Into<String>) -> Self {
        Self::new(ModelErrorKind::Unavailable, model, message)
    }

    pub fn fatal(model: &str, message: impl Into<String>) -> Self {
        Self::new(ModelErrorKind::Fatal, model, message)
    }

    /// Classify an HTTP error status from the model API.
    pub fn from_status(model: &str, status: u16, message: impl Into<String>) -> Self {
        let kind = match status {
            429 => ModelErrorKind::RateLimited,
            503 => ModelErrorKind::Unavailable,
            _ => ModelErrorKind::Fatal,
        };
        Self::new(kind, model, format!("HTTP {}: {}", status, message.into()))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            ModelErrorKind::RateLimited | ModelErrorKind::Unavailable
        )
    }
}

/// The suggestion could not be produced.
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("AI suggestion unavailable: {0}")]
    Unavailable(String),

    #[error("spending could not be normalized: {0}")]
    Conversion(#[from] RateError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(
            ModelError::from_status("m", 429, "quota").kind,
            ModelErrorKind::RateLimited
        );
        assert_eq!(
            ModelError::from_status("m", 503, "busy").kind,
            ModelErrorKind::Unavailable
        );
        assert_eq!(
            ModelError::from_status("m", 400, "bad").kind,
            ModelErrorKind::Fatal
        );
        assert_eq!(
            ModelError::from_status("m", 500, "oops").kind,
            ModelErrorKind::Fatal
        );
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ModelError::rate_limited("m", "").is_retryable());
        assert!(ModelError::unavailable("m", "").is_retryable());
        assert!(!ModelError::fatal("m", "").is_retryable());
    }
}
