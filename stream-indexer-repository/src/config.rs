//! Configuration types for bulk delivery.

use std::time::Duration;

use crate::utils::SNIPPET_MAX_CHARS;

/// Bounded exponential backoff for retriable bulk responses.
///
/// Attempt `n` (starting at 1) that fails with a retriable status waits
/// `min(base_delay * 2^(n-1), max_delay)` before attempt `n + 1`. With the
/// defaults this gives 1s, 2s and 4s between four attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Create a policy. At least one attempt is always made.
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// Delay to wait after the given failed attempt.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Whether another attempt is allowed after `attempt`.
    pub fn allows_retry_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// Configuration for the bulk delivery engine.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Retry schedule for throttled or failing requests.
    pub retry: RetryPolicy,
    /// Maximum characters of a response body kept in errors and logs.
    pub snippet_max_chars: usize,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            snippet_max_chars: SNIPPET_MAX_CHARS,
        }
    }
}

impl DeliveryConfig {
    /// Create a config with a custom retry policy.
    pub fn with_retry(retry: RetryPolicy) -> Self {
        Self {
            retry,
            ..Self::default()
        }
    }
}
