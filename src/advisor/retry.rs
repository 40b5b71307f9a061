//! Retry budget with exponential backoff.

use crate::config::ModelConfig;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay after the failed `attempt` (1-based): `base * 2^(attempt - 1)`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

impl From<&ModelConfig> for RetryPolicy {
    fn from(config: &ModelConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delays_double() {
        let policy = RetryPolicy::new(4, Duration::from_secs(5));
        let delays: Vec<u64> = (1..4).map(|a| policy.delay_after(a).as_secs()).collect();
        assert_eq!(delays, vec![5, 10, 20]);
    }

    #[test]
    fn test_zero_attempts_clamped() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[test]
    fn test_from_model_config() {
        let policy = RetryPolicy::from(&ModelConfig::new("gemini-1.5-flash"));
        assert_eq!(policy.max_attempts, 4);
        assert_eq!(policy.base_delay, Duration::from_millis(5_000));
    }
}
