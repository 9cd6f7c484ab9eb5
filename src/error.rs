//! Error types for Ratewarden.
//!
//! Quota exhaustion is not an error: limiters report it through
//! [`RateLimitDecision::allowed`](crate::ratelimit::RateLimitDecision).
//! Everything here is a configuration fault the caller has to fix.

use thiserror::Error;

/// Main error type for Ratewarden operations.
#[derive(Error, Debug)]
pub enum RateLimitError {
    /// Malformed window string, zero window or zero request ceiling
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Tier name outside the fixed enumeration
    #[error("Unknown tier: {0}")]
    UnknownTier(String),

    /// Configuration file or environment could not be loaded
    #[error("Config source error: {0}")]
    Config(#[from] config::ConfigError),
}

/// Result type alias for Ratewarden operations.
pub type Result<T> = std::result::Result<T, RateLimitError>;
