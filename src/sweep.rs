//! Periodic purge of expired cache entries.

use crate::advisor::SuggestionCache;
use crate::rates::ExchangeRateCache;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Background task that drops expired exchange rates and suggestions.
///
/// Reads already ignore expired entries; this only bounds memory.
pub struct CacheSweeper {
    rates: Arc<ExchangeRateCache>,
    suggestions: Arc<SuggestionCache>,
    interval: Duration,
}

impl CacheSweeper {
    pub fn new(
        rates: Arc<ExchangeRateCache>,
        suggestions: Arc<SuggestionCache>,
        interval: Duration,
    ) -> Self {
        Self {
            rates,
            suggestions,
            interval,
        }
    }

    /// One purge pass. Returns `(rates_removed, suggestions_removed)`.
    pub fn sweep_once(&self) -> (usize, usize) {
        (
            self.rates.purge_expired(),
            self.suggestions.purge_expired(),
        )
    }

    pub fn start(self, cancel_token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick completes immediately.
            interval.tick().await;

            tracing::info!(
                interval_seconds = self.interval.as_secs(),
                "Cache sweeper started"
            );

            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        tracing::info!("Cache sweeper shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let (rates, suggestions) = self.sweep_once();
                        tracing::debug!(
                            rates_removed = rates,
                            suggestions_removed = suggestions,
                            "Cache sweep completed"
                        );
                    }
                }
            }
        })
    }
}
