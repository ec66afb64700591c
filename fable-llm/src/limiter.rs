//! Process-wide backend rate limiter.
//!
//! A single shared "next allowed call" clock enforces a minimum interval
//! between any two backend calls. Concurrent callers from different
//! sessions serialize through one critical section: each caller reserves
//! the next free slot while holding the lock, then sleeps outside it, so
//! no two calls ever proceed within the minimum delay window.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::trace;

/// Shared minimum-interval gate for backend calls.
#[derive(Debug)]
pub struct RateLimiter {
    next_slot: Arc<Mutex<Option<Instant>>>,
    min_interval: Duration,
}

impl RateLimiter {
    /// Create a limiter with the given minimum inter-call delay.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            next_slot: Arc::new(Mutex::new(None)),
            min_interval,
        }
    }

    /// Wait until a call slot is available. Returns once the caller may
    /// proceed; the slot is reserved atomically, so concurrent waiters
    /// each receive a distinct slot spaced by the minimum interval.
    pub async fn acquire(&self) {
        let wait = {
            let mut next = self.next_slot.lock();
            let now = Instant::now();
            let slot = match *next {
                Some(at) if at > now => at,
                _ => now,
            };
            *next = Some(slot + self.min_interval);
            slot.saturating_duration_since(now)
        };
        if !wait.is_zero() {
            trace!(wait_ms = wait.as_millis() as u64, "rate limiter delaying backend call");
            tokio::time::sleep(wait).await;
        }
    }

    /// The configured minimum inter-call delay.
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

impl Clone for RateLimiter {
    fn clone(&self) -> Self {
        Self {
            next_slot: Arc::clone(&self.next_slot),
            min_interval: self.min_interval,
        }
    }
}
