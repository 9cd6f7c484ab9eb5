//! The rate limiter facade.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info};

use super::clock::{Clock, SystemClock};
use super::decision::RateLimitDecision;
use super::fixed::FixedWindowLimiter;
use super::janitor::{Janitor, JanitorHandle};
use super::policy::RateLimitPolicy;
use super::sliding::SlidingWindowLimiter;
use super::store::WindowStore;
use super::tier::{Tier, TierTable, TieredLimiter};
use crate::config::RateLimitingConfig;
use crate::error::Result;

/// Owns the window store and every limiter variant that shares it.
///
/// This struct is thread-safe and can be shared across multiple tasks.
/// Construct one per process and hand out `Arc<RateLimiter>`.
pub struct RateLimiter {
    store: Arc<WindowStore>,
    clock: Arc<dyn Clock>,
    fixed: FixedWindowLimiter,
    tiered: TieredLimiter,
    sliding: SlidingWindowLimiter,
    janitor: Mutex<Option<JanitorHandle>>,
}

impl RateLimiter {
    /// Create a rate limiter with the system clock, default tiers and no
    /// janitor.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock), TierTable::default())
    }

    /// Create a rate limiter with an explicit clock and tier table.
    pub fn with_clock(clock: Arc<dyn Clock>, tiers: TierTable) -> Self {
        let store = Arc::new(WindowStore::new());
        let fixed = FixedWindowLimiter::new(store.clone(), clock.clone());
        let tiered = TieredLimiter::with_tiers(fixed.clone(), tiers);
        let sliding = SlidingWindowLimiter::new(store.clone(), clock.clone());

        Self {
            store,
            clock,
            fixed,
            tiered,
            sliding,
            janitor: Mutex::new(None),
        }
    }

    /// Build a rate limiter from configuration and spawn its janitor.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: &RateLimitingConfig) -> Self {
        Self::start_with_clock(config, Arc::new(SystemClock))
    }

    /// Like [`RateLimiter::start`] with an explicit clock.
    pub fn start_with_clock(config: &RateLimitingConfig, clock: Arc<dyn Clock>) -> Self {
        let limiter = Self::with_clock(clock, config.tiers);
        let handle = Janitor::spawn(
            limiter.store.clone(),
            limiter.clock.clone(),
            Duration::from_secs(config.janitor_interval_secs),
        );
        *limiter.janitor.lock() = Some(handle);
        info!(
            janitor_interval_secs = config.janitor_interval_secs,
            "Rate limiter started"
        );
        limiter
    }

    /// Fixed-window check against an already parsed policy.
    pub fn check_fixed_window(
        &self,
        identifier: &str,
        policy: &RateLimitPolicy,
    ) -> RateLimitDecision {
        self.fixed.check(identifier, policy)
    }

    /// Fixed-window check with a string-typed window.
    ///
    /// A malformed window is a configuration error raised before the store
    /// is touched.
    pub fn check_fixed_window_raw(
        &self,
        identifier: &str,
        window: &str,
        max_requests: u64,
    ) -> Result<RateLimitDecision> {
        self.fixed.check_raw(identifier, window, max_requests)
    }

    /// Fixed-window check against the policy bound to `tier`.
    pub fn check_tier(&self, identifier: &str, tier: Tier) -> RateLimitDecision {
        self.tiered.check_tier(identifier, tier)
    }

    /// Tier check by name; unknown names are an `UnknownTier` error.
    pub fn check_tier_name(&self, identifier: &str, tier: &str) -> Result<RateLimitDecision> {
        self.tiered.check_tier_name(identifier, tier)
    }

    /// Sliding-window check with a window length in milliseconds.
    pub fn check_sliding_window(
        &self,
        identifier: &str,
        window_millis: u64,
        max_requests: u64,
    ) -> Result<RateLimitDecision> {
        self.sliding.check(identifier, window_millis, max_requests)
    }

    /// Clear `identifier`'s sliding window.
    pub fn reset_sliding_window(&self, identifier: &str) -> bool {
        let removed = self.sliding.reset(identifier);
        debug!(identifier, removed, "Reset sliding window");
        removed
    }

    /// Replace the tier table.
    pub fn set_tiers(&self, tiers: TierTable) {
        self.tiered.set_tiers(tiers);
    }

    /// The current tier table.
    pub fn tiers(&self) -> TierTable {
        self.tiered.tiers()
    }

    /// Evict expired records immediately, outside the janitor schedule.
    pub fn sweep_now(&self) -> usize {
        self.store.sweep(self.clock.now_millis())
    }

    /// The shared window store.
    pub fn store(&self) -> &Arc<WindowStore> {
        &self.store
    }

    /// Whether a janitor task is attached.
    pub fn has_janitor(&self) -> bool {
        self.janitor.lock().is_some()
    }

    /// Stop the janitor, if one is running, and wait for it.
    pub async fn shutdown(&self) {
        let handle = self.janitor.lock().take();
        if let Some(handle) = handle {
            handle.shutdown().await;
            info!("Rate limiter shut down");
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
