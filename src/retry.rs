//! Retry with exponential backoff.
//!
//! One policy covers both the list and the detail endpoint. Every failure is
//! retried until `max_attempts` is reached. The wait before retry `k`
//! (starting at 0) is `base_delay * 2^k`. A 429 answer waits at least
//! `rate_limit_floor`.
//!
//! ```rust
//! use product_fetcher::retry::RetryPolicy;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::default();
//! assert_eq!(policy.delay_for(0, false), Duration::from_secs(1));
//! assert_eq!(policy.delay_for(2, false), Duration::from_secs(4));
//! assert_eq!(policy.delay_for(0, true), Duration::from_secs(5));
//! assert_eq!(policy.delay_for(3, true), Duration::from_secs(8));
//! ```

use crate::error::{Error, Result};

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Default number of attempts per call.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
/// Default backoff unit.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
/// Default minimum wait after an HTTP 429.
pub const DEFAULT_RATE_LIMIT_FLOOR: Duration = Duration::from_secs(5);

/// Retry policy shared by every catalog call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Values below 1 act as 1.
    pub max_attempts: u32,
    /// Backoff unit; retry `k` waits `base_delay * 2^k`.
    pub base_delay: Duration,
    /// Minimum wait after a rate-limited attempt.
    pub rate_limit_floor: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            rate_limit_floor: DEFAULT_RATE_LIMIT_FLOOR,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the default delays and the given attempt count.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Set the backoff unit.
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Set the minimum wait after a 429.
    pub fn with_rate_limit_floor(mut self, floor: Duration) -> Self {
        self.rate_limit_floor = floor;
        self
    }

    /// Attempts actually made, never zero.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Wait before retry number `retry` (0 for the first retry).
    pub fn delay_for(&self, retry: u32, rate_limited: bool) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        let backoff = self.base_delay.saturating_mul(factor);
        if rate_limited {
            backoff.max(self.rate_limit_floor)
        } else {
            backoff
        }
    }

    /// Run `op` until it succeeds or the attempts are used up.
    ///
    /// On exhaustion the last error is wrapped in [`Error::ExhaustedRetries`]
    /// together with `target`.
    pub async fn run<T, F, Fut>(&self, target: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.attempts();
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!("{} succeeded on attempt {}", target, attempt + 1);
                    }
                    return Ok(value);
                }
                Err(e) if attempt + 1 >= attempts => {
                    return Err(Error::ExhaustedRetries {
                        target: target.to_string(),
                        attempts,
                        source: Box::new(e),
                    });
                }
                Err(e) => {
                    let wait = self.delay_for(attempt, e.is_rate_limited());
                    warn!(
                        "{} failed on attempt {}/{}: {}; retrying in {:?}",
                        target,
                        attempt + 1,
                        attempts,
                        e,
                        wait
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }
}
