//! Rate limiting algorithms and the shared window store.

mod clock;
mod decision;
mod fixed;
mod janitor;
mod limiter;
mod policy;
mod sliding;
mod store;
mod tier;
mod window;

pub use clock::{Clock, ManualClock, SystemClock};
pub use decision::RateLimitDecision;
pub use fixed::FixedWindowLimiter;
pub use janitor::{Janitor, JanitorHandle, DEFAULT_SWEEP_INTERVAL};
pub use limiter::RateLimiter;
pub use policy::RateLimitPolicy;
pub use sliding::SlidingWindowLimiter;
pub use store::{WindowRecord, WindowStore};
pub use tier::{Tier, TierTable, TieredLimiter};
pub use window::{TimeUnit, WindowDuration};
