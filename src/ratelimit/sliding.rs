//! Sliding-window limiter.
//!
//! Each caller's window is anchored to their own first request after the
//! previous window expired, rather than to the epoch grid. This is a
//! single-counter approximation of a sliding log: the window re-bases only
//! when it has fully elapsed.

use std::sync::Arc;
use tracing::{debug, trace};

use super::clock::Clock;
use super::decision::RateLimitDecision;
use super::store::{WindowRecord, WindowStore};
use crate::error::{RateLimitError, Result};

/// Key prefix for sliding-window records.
const KEY_PREFIX: &str = "sliding";

/// Caller-anchored window limiter over a shared [`WindowStore`].
#[derive(Clone)]
pub struct SlidingWindowLimiter {
    store: Arc<WindowStore>,
    clock: Arc<dyn Clock>,
}

impl SlidingWindowLimiter {
    /// Create a limiter over `store`, reading time from `clock`.
    pub fn new(store: Arc<WindowStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Store key for `identifier`.
    pub fn key(identifier: &str) -> String {
        format!("{}:{}", KEY_PREFIX, identifier)
    }

    /// Count one operation for `identifier` in a window of `window_millis`.
    pub fn check(
        &self,
        identifier: &str,
        window_millis: u64,
        max_requests: u64,
    ) -> Result<RateLimitDecision> {
        if window_millis == 0 {
            return Err(RateLimitError::Configuration(
                "sliding window duration must be greater than zero".to_string(),
            ));
        }
        if max_requests == 0 {
            return Err(RateLimitError::Configuration(
                "max_requests must be greater than zero".to_string(),
            ));
        }

        let now = self.clock.now_millis();
        let key = Self::key(identifier);

        trace!(
            key = %key,
            max = max_requests,
            window_ms = window_millis,
            "Checking sliding window"
        );

        let decision = self.store.update(&key, |current| {
            let mut record = match current {
                Some(record) if now < record.reset_at => record.clone(),
                _ => {
                    debug!(key = %key, "Starting sliding window");
                    WindowRecord::new(key.clone(), now.saturating_add(window_millis))
                }
            };

            if record.count >= max_requests {
                debug!(
                    key = %key,
                    count = record.count,
                    limit = max_requests,
                    "Sliding window limit exceeded"
                );
                return (
                    None,
                    RateLimitDecision::reject(max_requests, record.reset_at, now),
                );
            }

            record.count += 1;
            let decision = RateLimitDecision::allow(max_requests, record.count, record.reset_at);
            (Some(record), decision)
        });

        Ok(decision)
    }

    /// Forget `identifier`'s current window so its next request starts fresh.
    pub fn reset(&self, identifier: &str) -> bool {
        self.store.remove(&Self::key(identifier)).is_some()
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<WindowStore> {
        &self.store
    }
}
