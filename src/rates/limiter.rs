//! Process-wide pacing for upstream currency-API calls.
//!
//! The provider enforces a requests-per-minute quota shared by every user of
//! the process, so all calls funnel through one [`RateLimiter`]. Callers are
//! admitted in arrival order (the tokio mutex is fair) and consecutive task
//! starts are at least `min_interval` apart.

use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub struct RateLimiter {
    min_interval: Duration,
    next_start: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_start: Mutex::new(None),
        }
    }

    /// Wait for the next free slot, then run `task` to completion.
    pub async fn schedule<F, Fut, T>(&self, task: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.acquire().await;
        task().await
    }

    async fn acquire(&self) {
        let mut next_start = self.next_start.lock().await;
        if let Some(at) = *next_start {
            let now = Instant::now();
            if at > now {
                tracing::debug!(
                    wait_ms = (at - now).as_millis() as u64,
                    "waiting for upstream rate limit slot"
                );
                tokio::time::sleep_until(at).await;
            }
        }
        *next_start = Some(Instant::now() + self.min_interval);
    }
}
