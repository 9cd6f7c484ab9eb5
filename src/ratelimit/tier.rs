//! Caller tiers and the tier-to-policy table.

use std::fmt;
use std::str::FromStr;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::decision::RateLimitDecision;
use super::fixed::FixedWindowLimiter;
use super::policy::RateLimitPolicy;
use super::window::{TimeUnit, WindowDuration};
use crate::error::{RateLimitError, Result};

/// A named class of caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Free,
    Premium,
    Enterprise,
}

impl Tier {
    /// Every tier, cheapest first.
    pub const ALL: [Tier; 3] = [Tier::Free, Tier::Premium, Tier::Enterprise];

    /// The configuration name of this tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Premium => "premium",
            Tier::Enterprise => "enterprise",
        }
    }
}

impl FromStr for Tier {
    type Err = RateLimitError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "free" => Ok(Tier::Free),
            "premium" => Ok(Tier::Premium),
            "enterprise" => Ok(Tier::Enterprise),
            other => Err(RateLimitError::UnknownTier(other.to_string())),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy bound to each tier.
///
/// Tiers left out of a configuration file keep their default policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTable {
    #[serde(default = "default_free")]
    pub free: RateLimitPolicy,
    #[serde(default = "default_premium")]
    pub premium: RateLimitPolicy,
    #[serde(default = "default_enterprise")]
    pub enterprise: RateLimitPolicy,
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            free: default_free(),
            premium: default_premium(),
            enterprise: default_enterprise(),
        }
    }
}

fn hourly(max_requests: u64) -> RateLimitPolicy {
    let hour = WindowDuration::new(1, TimeUnit::Hour).expect("one hour is a valid window");
    RateLimitPolicy::from_window(hour, max_requests).expect("default ceilings are non-zero")
}

fn default_free() -> RateLimitPolicy {
    hourly(10)
}

fn default_premium() -> RateLimitPolicy {
    hourly(100)
}

fn default_enterprise() -> RateLimitPolicy {
    hourly(1000)
}

impl TierTable {
    /// The policy bound to `tier`.
    pub fn policy(&self, tier: Tier) -> &RateLimitPolicy {
        match tier {
            Tier::Free => &self.free,
            Tier::Premium => &self.premium,
            Tier::Enterprise => &self.enterprise,
        }
    }
}

/// Fixed-window limiting by tier name instead of raw window/max pairs.
pub struct TieredLimiter {
    limiter: FixedWindowLimiter,
    tiers: RwLock<TierTable>,
}

impl TieredLimiter {
    /// Create a tiered limiter with the default table.
    pub fn new(limiter: FixedWindowLimiter) -> Self {
        Self::with_tiers(limiter, TierTable::default())
    }

    /// Create a tiered limiter with an explicit table.
    pub fn with_tiers(limiter: FixedWindowLimiter, tiers: TierTable) -> Self {
        Self {
            limiter,
            tiers: RwLock::new(tiers),
        }
    }

    /// Replace the tier table. Existing counters are kept.
    pub fn set_tiers(&self, tiers: TierTable) {
        info!(
            free = tiers.free.max_requests(),
            premium = tiers.premium.max_requests(),
            enterprise = tiers.enterprise.max_requests(),
            "Updating tier table"
        );
        *self.tiers.write() = tiers;
    }

    /// The current tier table.
    pub fn tiers(&self) -> TierTable {
        *self.tiers.read()
    }

    /// Check `identifier` against the policy bound to `tier`.
    pub fn check_tier(&self, identifier: &str, tier: Tier) -> RateLimitDecision {
        let policy = *self.tiers.read().policy(tier);
        self.limiter.check(identifier, &policy)
    }

    /// Check by tier name. Unknown names fail before any store access.
    pub fn check_tier_name(&self, identifier: &str, tier: &str) -> Result<RateLimitDecision> {
        let tier: Tier = tier.parse()?;
        Ok(self.check_tier(identifier, tier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::clock::ManualClock;
    use crate::ratelimit::store::WindowStore;
    use std::sync::Arc;

    fn fixed_limiter() -> FixedWindowLimiter {
        FixedWindowLimiter::new(Arc::new(WindowStore::new()), Arc::new(ManualClock::new(0)))
    }

    #[test]
    fn test_default_table() {
        let table = TierTable::default();
        assert_eq!(table.policy(Tier::Free), &RateLimitPolicy::new("1h", 10).unwrap());
        assert_eq!(table.policy(Tier::Premium), &RateLimitPolicy::new("1h", 100).unwrap());
        assert_eq!(table.policy(Tier::Enterprise), &RateLimitPolicy::new("1h", 1000).unwrap());
    }

    #[test]
    fn test_tier_parse() {
        for tier in Tier::ALL {
            assert_eq!(tier.as_str().parse::<Tier>().unwrap(), tier);
        }
        assert!(matches!(
            "platinum".parse::<Tier>(),
            Err(RateLimitError::UnknownTier(name)) if name == "platinum"
        ));
        assert!("Free".parse::<Tier>().is_err());
    }

    #[test]
    fn test_partial_table_from_yaml() {
        let yaml = r#"
premium:
  window: 1m
  max_requests: 20
"#;
        let table: TierTable = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(table.premium, RateLimitPolicy::new("1m", 20).unwrap());
        assert_eq!(table.free, default_free());
        assert_eq!(table.enterprise, default_enterprise());
    }

    #[test]
    fn test_free_tier_ceiling() {
        let limiter = TieredLimiter::new(fixed_limiter());

        for _ in 0..10 {
            assert!(limiter.check_tier("user", Tier::Free).allowed);
        }
        let decision = limiter.check_tier("user", Tier::Free);
        assert!(!decision.allowed);
        assert_eq!(decision.limit, 10);
    }

    #[test]
    fn test_enterprise_matches_fixed_window() {
        let tiered = TieredLimiter::new(fixed_limiter());
        let fixed = fixed_limiter();
        let policy = RateLimitPolicy::new("1h", 1000).unwrap();

        for _ in 0..1001 {
            assert_eq!(
                tiered.check_tier("user", Tier::Enterprise),
                fixed.check("user", &policy)
            );
        }
    }

    #[test]
    fn test_unknown_tier_name_touches_nothing() {
        let fixed = fixed_limiter();
        let store = fixed.store().clone();
        let limiter = TieredLimiter::new(fixed);

        assert!(matches!(
            limiter.check_tier_name("user", "gold"),
            Err(RateLimitError::UnknownTier(_))
        ));
        assert!(store.is_empty());

        let decision = limiter.check_tier_name("user", "premium").unwrap();
        assert_eq!(decision.remaining, 99);
    }

    #[test]
    fn test_set_tiers() {
        let limiter = TieredLimiter::new(fixed_limiter());
        let mut table = TierTable::default();
        table.free = RateLimitPolicy::new("1h", 1).unwrap();
        limiter.set_tiers(table);

        assert_eq!(limiter.tiers().free.max_requests(), 1);
        assert!(limiter.check_tier("user", Tier::Free).allowed);
        assert!(!limiter.check_tier("user", Tier::Free).allowed);
    }
}
