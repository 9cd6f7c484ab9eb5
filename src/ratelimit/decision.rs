//! The outcome of a rate limit check.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Result of a single limiter call.
///
/// Quota exhaustion is reported here with `allowed == false`, never as an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    /// Whether the operation may proceed
    pub allowed: bool,
    /// The ceiling in effect
    pub limit: u64,
    /// Quota left after this call
    pub remaining: u64,
    /// Epoch milliseconds at which the quota is next available in full
    pub reset_at: u64,
    /// Whole seconds until `reset_at`, rounded up. Only set on rejection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl RateLimitDecision {
    pub(crate) fn allow(limit: u64, count: u64, reset_at: u64) -> Self {
        Self {
            allowed: true,
            limit,
            remaining: limit.saturating_sub(count),
            reset_at,
            retry_after_secs: None,
        }
    }

    pub(crate) fn reject(limit: u64, reset_at: u64, now: u64) -> Self {
        Self {
            allowed: false,
            limit,
            remaining: 0,
            reset_at,
            retry_after_secs: Some(reset_at.saturating_sub(now).div_ceil(1000)),
        }
    }

    /// `reset_at` as a UTC timestamp.
    pub fn reset_time(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.reset_at as i64).unwrap_or_default()
    }
}
