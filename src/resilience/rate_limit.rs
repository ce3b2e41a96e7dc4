/// Sliding-window rate limiter
///
/// Admission is bounded per rolling 1-second window: timestamps older than
/// one second are purged on every call, and a request is denied once the
/// window already holds `rate_limit` admissions. Bursts up to the limit are
/// allowed; there is no smoothing beyond the window.
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default requests-per-second limit
pub const DEFAULT_RATE_LIMIT: f64 = 5.0;

const WINDOW: Duration = Duration::from_secs(1);

pub struct RateLimiter {
    rate_limit: f64,
    admissions: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(rate_limit: f64) -> Self {
        Self {
            rate_limit,
            admissions: Mutex::new(VecDeque::new()),
        }
    }

    /// Requests admission for one fetch in the current window.
    ///
    /// Returns false when the window is full; the caller should treat this
    /// as "not yet" and re-request admission later, not as a failure.
    /// A poisoned lock fails open: limiting is protective, not load-bearing.
    pub fn admit(&self) -> bool {
        let now = Instant::now();
        let Ok(mut admissions) = self.admissions.lock() else {
            return true;
        };

        while let Some(oldest) = admissions.front() {
            if now.duration_since(*oldest) >= WINDOW {
                admissions.pop_front();
            } else {
                break;
            }
        }

        if admissions.len() as f64 >= self.rate_limit {
            tracing::debug!(
                in_window = admissions.len(),
                rate_limit = self.rate_limit,
                "Rate limit reached, denying admission"
            );
            return false;
        }

        admissions.push_back(now);
        true
    }

    /// Number of admissions granted within the last second
    pub fn requests_last_second(&self) -> usize {
        let now = Instant::now();
        match self.admissions.lock() {
            Ok(admissions) => admissions
                .iter()
                .filter(|t| now.duration_since(**t) < WINDOW)
                .count(),
            Err(_) => 0,
        }
    }

    /// Configured requests-per-second limit
    pub fn rate_limit(&self) -> f64 {
        self.rate_limit
    }
}
