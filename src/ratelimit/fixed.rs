//! Fixed-window limiter.
//!
//! Time is cut into epoch-aligned buckets of the policy's window length and
//! each caller gets one counter per bucket. Old buckets are never deleted on
//! the check path; they age out and the janitor evicts them.
//!
//! A caller can be accepted up to `2 * max_requests` times across a bucket
//! boundary. That is the documented cost of O(1) bucket accounting.

use std::sync::Arc;
use tracing::{debug, trace};

use super::clock::Clock;
use super::decision::RateLimitDecision;
use super::policy::RateLimitPolicy;
use super::store::{WindowRecord, WindowStore};
use crate::error::Result;

/// Key prefix for fixed-window records.
const KEY_PREFIX: &str = "fixed";

/// Epoch-aligned fixed-window limiter over a shared [`WindowStore`].
#[derive(Clone)]
pub struct FixedWindowLimiter {
    store: Arc<WindowStore>,
    clock: Arc<dyn Clock>,
}

impl FixedWindowLimiter {
    /// Create a limiter over `store`, reading time from `clock`.
    pub fn new(store: Arc<WindowStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Store key for `identifier` in the bucket containing `now`.
    pub fn bucket_key(identifier: &str, window_millis: u64, now: u64) -> String {
        format!("{}:{}:{}", KEY_PREFIX, identifier, now / window_millis)
    }

    /// Count one operation for `identifier` against `policy`.
    ///
    /// Rejections leave the stored record untouched.
    pub fn check(&self, identifier: &str, policy: &RateLimitPolicy) -> RateLimitDecision {
        let now = self.clock.now_millis();
        let window = policy.window().as_millis();
        let max = policy.max_requests();
        let key = Self::bucket_key(identifier, window, now);

        trace!(key = %key, max, window_ms = window, "Checking fixed window");

        self.store.update(&key, |current| {
            let mut record = match current {
                Some(record) => record.clone(),
                None => {
                    debug!(key = %key, "Creating fixed window record");
                    WindowRecord::new(key.clone(), now.saturating_add(window))
                }
            };

            if record.count >= max {
                debug!(
                    key = %key,
                    count = record.count,
                    limit = max,
                    "Fixed window limit exceeded"
                );
                return (None, RateLimitDecision::reject(max, record.reset_at, now));
            }

            record.count += 1;
            record.reset_at = now.saturating_add(window);
            let decision = RateLimitDecision::allow(max, record.count, record.reset_at);
            (Some(record), decision)
        })
    }

    /// Parse a string-typed policy and check it.
    ///
    /// A malformed window or a zero ceiling fails before the store is
    /// touched.
    pub fn check_raw(
        &self,
        identifier: &str,
        window: &str,
        max_requests: u64,
    ) -> Result<RateLimitDecision> {
        let policy = RateLimitPolicy::new(window, max_requests)?;
        Ok(self.check(identifier, &policy))
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<WindowStore> {
        &self.store
    }
}
