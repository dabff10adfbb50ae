//! Delay strategies between retry attempts
//!
//! After a retryable transport fault the dispatcher asks a [`BackoffStrategy`]
//! how long to wait before the next attempt. The number of attempts is not the
//! strategy's business: `maxRetries` in the client configuration decides that.
//!
//! # Built-in Strategies
//!
//! - **ExponentialBackoff**: `base * 2^attempt`, capped, optional jitter (default)
//! - **FixedDelay**: constant delay between attempts
//!
//! # Examples
//!
//! ```rust
//! use noderpc_client::{BackoffStrategy, ExponentialBackoff};
//! use std::time::Duration;
//!
//! let backoff = ExponentialBackoff::new(Duration::from_millis(100), Duration::from_secs(5));
//! assert_eq!(backoff.delay(0), Duration::from_millis(100));
//! assert_eq!(backoff.delay(3), Duration::from_millis(800));
//! assert_eq!(backoff.delay(10), Duration::from_secs(5));
//! ```

use std::time::Duration;

/// Computes the pause before retry number `attempt` (0-indexed)
///
/// Strategies are shared by every call of a client, so `delay` takes `&self`
/// and must not depend on per-call state.
pub trait BackoffStrategy: Send + Sync {
    /// Delay before the retry that follows failed attempt `attempt`
    fn delay(&self, attempt: u32) -> Duration;
}

/// Exponential backoff with an upper bound and optional jitter
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base: Duration,
    cap: Duration,
    jitter: bool,
}

impl ExponentialBackoff {
    /// Create a strategy starting at `base` and never exceeding `cap`
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self {
            base,
            cap,
            jitter: false,
        }
    }

    /// Add a random 0-25% on top of each delay, still bounded by the cap
    pub fn with_jitter(mut self) -> Self {
        self.jitter = true;
        self
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(100), Duration::from_secs(5))
    }
}

impl BackoffStrategy for ExponentialBackoff {
    fn delay(&self, attempt: u32) -> Duration {
        let base_ms = u64::try_from(self.base.as_millis()).unwrap_or(u64::MAX);
        let cap_ms = u64::try_from(self.cap.as_millis()).unwrap_or(u64::MAX);

        let factor = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
        let delay = base_ms.saturating_mul(factor).min(cap_ms);

        if self.jitter && delay >= 4 {
            use rand::Rng;
            let jitter_ms = rand::thread_rng().gen_range(0..=(delay / 4));
            return Duration::from_millis(delay.saturating_add(jitter_ms).min(cap_ms));
        }

        Duration::from_millis(delay)
    }
}

/// Same delay before every retry
#[derive(Debug, Clone)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    /// Create a fixed delay strategy
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl BackoffStrategy for FixedDelay {
    fn delay(&self, _attempt: u32) -> Duration {
        self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_backoff_doubles() {
        let strategy = ExponentialBackoff::new(Duration::from_millis(100), Duration::from_secs(10));

        assert_eq!(strategy.delay(0), Duration::from_millis(100));
        assert_eq!(strategy.delay(1), Duration::from_millis(200));
        assert_eq!(strategy.delay(2), Duration::from_millis(400));
    }

    #[test]
    fn test_exponential_backoff_capped() {
        let strategy = ExponentialBackoff::new(Duration::from_millis(100), Duration::from_secs(1));
        assert_eq!(strategy.delay(10), Duration::from_millis(1000));
    }

    #[test]
    fn test_exponential_backoff_huge_attempt_saturates() {
        let strategy = ExponentialBackoff::new(Duration::from_millis(100), Duration::from_secs(5));
        assert_eq!(strategy.delay(200), Duration::from_secs(5));
    }

    #[test]
    fn test_exponential_backoff_jitter_range() {
        let strategy = ExponentialBackoff::new(Duration::from_millis(100), Duration::from_secs(10))
            .with_jitter();

        for _ in 0..50 {
            let delay = strategy.delay(0);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(125));
        }
    }

    #[test]
    fn test_jitter_never_exceeds_cap() {
        let strategy = ExponentialBackoff::new(Duration::from_millis(100), Duration::from_millis(300))
            .with_jitter();

        for attempt in 0..8 {
            for _ in 0..20 {
                assert!(strategy.delay(attempt) <= Duration::from_millis(300));
            }
        }
        for _ in 0..20 {
            assert_eq!(strategy.delay(5), Duration::from_millis(300));
        }
    }

    #[test]
    fn test_zero_base_means_no_wait() {
        let strategy = ExponentialBackoff::new(Duration::ZERO, Duration::ZERO).with_jitter();
        assert_eq!(strategy.delay(3), Duration::ZERO);
    }

    #[test]
    fn test_fixed_delay() {
        let strategy = FixedDelay::new(Duration::from_secs(1));
        assert_eq!(strategy.delay(0), Duration::from_secs(1));
        assert_eq!(strategy.delay(7), Duration::from_secs(1));
    }
}
