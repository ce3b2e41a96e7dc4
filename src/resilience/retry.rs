/// Retry policy with exponential backoff and jitter
///
/// The orchestrator wraps its fetch step in an explicit retry loop driven by
/// this value: delay grows exponentially per attempt, capped at a maximum,
/// and randomized to prevent thundering-herd retries.
use rand::Rng;
use std::time::Duration;

/// Default total attempts (initial fetch plus retries)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default first-retry delay
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Default delay ceiling
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);

/// Default exponential growth factor
pub const DEFAULT_EXPONENTIAL_BASE: f64 = 2.0;

/// Default jitter fraction (delay is scaled by 1 ± jitter)
pub const DEFAULT_JITTER: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts allowed, counting the initial fetch
    pub max_attempts: u32,

    /// Delay before the first retry
    pub base_delay: Duration,

    /// Upper bound on any single delay, before jitter
    pub max_delay: Duration,

    /// Per-attempt growth factor
    pub exponential_base: f64,

    /// Fraction of random spread applied to each delay
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            exponential_base: DEFAULT_EXPONENTIAL_BASE,
            jitter: DEFAULT_JITTER,
        }
    }
}

impl RetryPolicy {
    /// Computes the backoff delay before retry number `attempt` (1-based).
    ///
    /// `base_delay * exponential_base^(attempt - 1)`, capped at `max_delay`,
    /// then scaled by a random factor in `[1 - jitter, 1 + jitter]`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let base = self.base_delay.as_secs_f64() * self.exponential_base.powi(exponent as i32);
        let capped = base.min(self.max_delay.as_secs_f64());

        if self.jitter <= 0.0 {
            return Duration::from_secs_f64(capped);
        }

        let jitter = rand::rng().random_range(-self.jitter..=self.jitter);
        Duration::from_secs_f64((capped * (1.0 + jitter)).max(0.0))
    }

    /// Returns true once `attempt` attempts have been used up
    pub fn is_exhausted(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }
}
