/// Crawl status definitions for tracking request progress
///
/// This module defines the status state machine every request moves through,
/// plus the pure transition function used by the orchestrator.
use serde::Serialize;
use std::fmt;

/// Represents the current status of a crawl request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlStatus {
    // ===== Active States =====
    /// Request has been accepted but not yet dispatched
    Pending,

    /// Request is currently being fetched
    InProgress,

    /// Request failed transiently and is waiting for another attempt
    Retry,

    // ===== Terminal States =====
    /// Request completed and produced content
    Success,

    /// Request failed permanently or exhausted its retry budget
    Failed,

    /// Request was rejected by the pre-fetch filter - never dispatched
    Skipped,
}

/// Outcome of one pass through the fetch pipeline, fed to [`CrawlStatus::advance`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Fetch and extraction completed
    Fetched,

    /// Network-level failure (timeout, connection) - retry eligible
    TransientError,

    /// Structural failure (bad request, HTTP rejection) - never retried
    PermanentError,

    /// URL rejected by the blocked-host/extension filter
    Filtered,
}

impl CrawlStatus {
    /// Returns true if this is a terminal status (no further transitions occur)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Skipped)
    }

    /// Returns true if the request may still make progress
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns true if this represents a permanent failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Returns true if the request was filtered out before fetching
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    /// Computes the next status from the current one and a pipeline outcome.
    ///
    /// Pure function - the orchestrator owns the retry counter and passes it
    /// in together with the request's bound. Terminal statuses never move.
    ///
    /// Transitions:
    /// - `Pending` + filtered outcome → `Skipped`
    /// - `Pending`/`Retry` + any other outcome → `InProgress` (dispatch)
    /// - `InProgress` + fetched → `Success`
    /// - `InProgress` + transient error → `Retry` while `retry_count < max_retries`,
    ///   otherwise `Failed`
    /// - `InProgress` + permanent error → `Failed`
    pub fn advance(self, outcome: FetchOutcome, retry_count: u32, max_retries: u32) -> Self {
        if self.is_terminal() {
            return self;
        }

        match (self, outcome) {
            (Self::Pending, FetchOutcome::Filtered) => Self::Skipped,
            (Self::Pending, _) | (Self::Retry, _) => Self::InProgress,
            (Self::InProgress, FetchOutcome::Fetched) => Self::Success,
            (Self::InProgress, FetchOutcome::TransientError) => {
                if retry_count < max_retries {
                    Self::Retry
                } else {
                    Self::Failed
                }
            }
            (Self::InProgress, FetchOutcome::PermanentError) => Self::Failed,
            (Self::InProgress, FetchOutcome::Filtered) => Self::Skipped,
            // Terminal states already returned above; keeps the match total
            (terminal, _) => terminal,
        }
    }

    /// Returns the lowercase string form used in reports and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Retry => "retry",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }

    /// Parses a status from its string form
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_str_repr(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "retry" => Some(Self::Retry),
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }

    /// Returns all possible statuses
    pub fn all_statuses() -> Vec<Self> {
        vec![
            Self::Pending,
            Self::InProgress,
            Self::Retry,
            Self::Success,
            Self::Failed,
            Self::Skipped,
        ]
    }
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
