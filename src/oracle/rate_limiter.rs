// Request pacer for oracle calls.
//
// LLM endpoints throttle per key. When MATCHER_MAX_RPS is set, every oracle
// call waits here first so consecutive requests are at least 1/rps apart,
// even when several pairs are in flight.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Enforces a minimum spacing between requests.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<RateLimiterInner>>,
}

struct RateLimiterInner {
    /// Minimum time between requests
    interval: Duration,
    /// Earliest moment the next request may go out
    next_slot: Option<Instant>,
}

impl RateLimiter {
    /// Create a pacer that keeps requests at least `interval` apart.
    pub fn new(interval: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RateLimiterInner {
                interval,
                next_slot: None,
            })),
        }
    }

    /// Wait until a request is allowed, then return.
    ///
    /// Each caller reserves the next free slot under the lock and sleeps
    /// outside it, so concurrent callers queue up one interval apart.
    pub async fn acquire(&self) {
        let wait_until = {
            let mut inner = self.inner.lock().await;
            let now = Instant::now();
            let slot = match inner.next_slot {
                Some(next) if next > now => next,
                _ => now,
            };
            inner.next_slot = Some(slot + inner.interval);
            slot
        };

        tokio::time::sleep_until(wait_until).await;
    }
}
