//! Rate limit policies.

use serde::{Deserialize, Serialize};

use super::window::WindowDuration;
use crate::error::{RateLimitError, Result};

/// A window length paired with the request ceiling for that window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PolicyFields", into = "PolicyFields")]
pub struct RateLimitPolicy {
    window: WindowDuration,
    max_requests: u64,
}

/// The string-typed form policies take in configuration files.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PolicyFields {
    window: String,
    max_requests: u64,
}

impl RateLimitPolicy {
    /// Parse and validate a policy from its configuration form.
    pub fn new(window: &str, max_requests: u64) -> Result<Self> {
        Self::from_window(WindowDuration::parse(window)?, max_requests)
    }

    /// Build a policy from an already parsed window.
    pub fn from_window(window: WindowDuration, max_requests: u64) -> Result<Self> {
        if max_requests == 0 {
            return Err(RateLimitError::Configuration(
                "max_requests must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            window,
            max_requests,
        })
    }

    /// The window length.
    pub fn window(&self) -> WindowDuration {
        self.window
    }

    /// Maximum accepted requests per window.
    pub fn max_requests(&self) -> u64 {
        self.max_requests
    }
}

impl TryFrom<PolicyFields> for RateLimitPolicy {
    type Error = RateLimitError;

    fn try_from(fields: PolicyFields) -> Result<Self> {
        Self::new(&fields.window, fields.max_requests)
    }
}

impl From<RateLimitPolicy> for PolicyFields {
    fn from(policy: RateLimitPolicy) -> Self {
        Self {
            window: policy.window.to_string(),
            max_requests: policy.max_requests,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_new() {
        let policy = RateLimitPolicy::new("1h", 100).unwrap();
        assert_eq!(policy.window().as_millis(), 3_600_000);
        assert_eq!(policy.max_requests(), 100);
    }

    #[test]
    fn test_policy_rejects_zero_max() {
        assert!(matches!(
            RateLimitPolicy::new("1h", 0),
            Err(RateLimitError::Configuration(_))
        ));
    }

    #[test]
    fn test_policy_rejects_bad_window() {
        assert!(matches!(
            RateLimitPolicy::new("5x", 10),
            Err(RateLimitError::Configuration(_))
        ));
    }

    #[test]
    fn test_policy_from_yaml() {
        let yaml = r#"
window: 15m
max_requests: 25
"#;
        let policy: RateLimitPolicy = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(policy, RateLimitPolicy::new("15m", 25).unwrap());

        let yaml = r#"
window: 15 minutes
max_requests: 25
"#;
        assert!(serde_yaml::from_str::<RateLimitPolicy>(yaml).is_err());
    }
}
