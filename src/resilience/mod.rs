//! Resilience: rate limiting and retry eligibility
//!
//! Two independent policies composed behind one manager:
//!
//! - `RateLimiter`: sliding 1-second admission window
//! - `RetryPolicy`: exponential backoff with jitter and an attempt bound
//!
//! Rate-limit denial is "not yet", never a failure; retries happen only for
//! transient errors and only while the attempt budget lasts.

mod rate_limit;
mod retry;

pub use rate_limit::{RateLimiter, DEFAULT_RATE_LIMIT};
pub use retry::{
    RetryPolicy, DEFAULT_BASE_DELAY, DEFAULT_EXPONENTIAL_BASE, DEFAULT_JITTER, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_DELAY,
};

use crate::crawler::FetchError;
use serde::Serialize;

/// Default retry bound applied when a request does not carry its own
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Point-in-time resilience statistics
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ResilienceStats {
    pub rate_limit: f64,
    pub max_retries: u32,
    pub current_rate: usize,
    pub requests_last_second: usize,
}

/// Composes the rate limiter and retry policy behind one interface
pub struct ResilienceManager {
    limiter: RateLimiter,
    policy: RetryPolicy,
    max_retries: u32,
}

impl ResilienceManager {
    pub fn new(rate_limit: f64, max_retries: u32) -> Self {
        Self {
            limiter: RateLimiter::new(rate_limit),
            policy: RetryPolicy::default(),
            max_retries,
        }
    }

    /// Replaces the backoff policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Asks the rate limiter for admission in the current window
    pub fn admit(&self) -> bool {
        self.limiter.admit()
    }

    /// Decides retry eligibility against the manager's own retry bound.
    ///
    /// `attempt` counts retries already consumed. Only transient errors are
    /// ever retried, regardless of remaining budget.
    pub fn should_retry(&self, attempt: u32, error: &FetchError) -> bool {
        self.should_retry_with(attempt, self.max_retries, error)
    }

    /// Decides retry eligibility against a per-request bound
    pub fn should_retry_with(&self, attempt: u32, max_retries: u32, error: &FetchError) -> bool {
        if attempt >= max_retries {
            return false;
        }
        error.is_transient()
    }

    /// The backoff policy used between retry attempts
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn stats(&self) -> ResilienceStats {
        let in_window = self.limiter.requests_last_second();
        ResilienceStats {
            rate_limit: self.limiter.rate_limit(),
            max_retries: self.max_retries,
            current_rate: in_window,
            requests_last_second: in_window,
        }
    }
}

impl Default for ResilienceManager {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_LIMIT, DEFAULT_MAX_RETRIES)
    }
}
