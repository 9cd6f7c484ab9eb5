//! Configuration management for Ratewarden.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::{RateLimitError, Result};
use crate::ratelimit::{TierTable, DEFAULT_SWEEP_INTERVAL};

/// Prefix for environment variable overrides, e.g.
/// `RATEWARDEN__RATELIMIT__JANITOR_INTERVAL_SECS=60`.
pub const ENV_PREFIX: &str = "RATEWARDEN";

/// Main configuration for Ratewarden.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WardenConfig {
    /// Rate limiting configuration
    #[serde(default)]
    pub ratelimit: RateLimitingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    /// Seconds between janitor sweeps
    #[serde(default = "default_janitor_interval")]
    pub janitor_interval_secs: u64,

    /// Policy bound to each tier
    #[serde(default)]
    pub tiers: TierTable,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            janitor_interval_secs: default_janitor_interval(),
            tiers: TierTable::default(),
        }
    }
}

fn default_janitor_interval() -> u64 {
    DEFAULT_SWEEP_INTERVAL.as_secs()
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl WardenConfig {
    /// Load configuration from a YAML file, with `RATEWARDEN__*`
    /// environment variables layered on top.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading configuration");

        let config: WardenConfig = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Yaml))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
            .map_err(|e| {
                RateLimitError::Configuration(format!("Failed to parse config: {}", e))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: WardenConfig = serde_yaml::from_str(yaml)
            .map_err(|e| RateLimitError::Configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check constraints the type system does not cover.
    ///
    /// Tier policies are already validated while deserializing.
    pub fn validate(&self) -> Result<()> {
        if self.ratelimit.janitor_interval_secs == 0 {
            return Err(RateLimitError::Configuration(
                "janitor_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::{RateLimitPolicy, Tier};

    #[test]
    fn test_defaults() {
        let config = WardenConfig::default();
        assert_eq!(config.ratelimit.janitor_interval_secs, 300);
        assert_eq!(config.ratelimit.tiers, TierTable::default());
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = WardenConfig::from_yaml("{}").unwrap();
        assert_eq!(config.ratelimit.janitor_interval_secs, 300);
        assert_eq!(config.ratelimit.tiers.policy(Tier::Free).max_requests(), 10);
    }

    #[test]
    fn test_parse_tier_overrides() {
        let yaml = r#"
ratelimit:
  janitor_interval_secs: 60
  tiers:
    free:
      window: 15m
      max_requests: 5
    enterprise:
      window: 1d
      max_requests: 50000
logging:
  level: debug
"#;
        let config = WardenConfig::from_yaml(yaml).unwrap();
        let tiers = config.ratelimit.tiers;

        assert_eq!(config.ratelimit.janitor_interval_secs, 60);
        assert_eq!(tiers.free, RateLimitPolicy::new("15m", 5).unwrap());
        assert_eq!(tiers.premium, RateLimitPolicy::new("1h", 100).unwrap());
        assert_eq!(tiers.enterprise, RateLimitPolicy::new("1d", 50000).unwrap());
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_malformed_tier_window_is_rejected() {
        let yaml = r#"
ratelimit:
  tiers:
    free:
      window: 5x
      max_requests: 10
"#;
        assert!(matches!(
            WardenConfig::from_yaml(yaml),
            Err(RateLimitError::Configuration(_))
        ));
    }

    #[test]
    fn test_zero_janitor_interval_is_rejected() {
        let yaml = r#"
ratelimit:
  janitor_interval_secs: 0
"#;
        assert!(WardenConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_from_file() {
        let path =
            std::env::temp_dir().join(format!("ratewarden-config-{}.yaml", std::process::id()));
        let yaml = r#"
ratelimit:
  janitor_interval_secs: 30
  tiers:
    premium:
      window: 30m
      max_requests: 40
"#;
        std::fs::write(&path, yaml).unwrap();

        let config = WardenConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.ratelimit.janitor_interval_secs, 30);
        assert_eq!(config.ratelimit.tiers.premium, RateLimitPolicy::new("30m", 40).unwrap());
    }

    #[test]
    fn test_from_file_malformed_tier_window() {
        let path =
            std::env::temp_dir().join(format!("ratewarden-bad-{}.yaml", std::process::id()));
        std::fs::write(
            &path,
            "ratelimit:\n  tiers:\n    free:\n      window: 5x\n      max_requests: 1\n",
        )
        .unwrap();

        let result = WardenConfig::from_file(&path);
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(RateLimitError::Configuration(_))));
    }

    #[test]
    fn test_from_file_env_override() {
        let path =
            std::env::temp_dir().join(format!("ratewarden-env-{}.yaml", std::process::id()));
        std::fs::write(&path, "logging:\n  level: info\n").unwrap();

        // No other test asserts on logging.level.
        std::env::set_var("RATEWARDEN__LOGGING__LEVEL", "trace");
        let result = WardenConfig::from_file(&path);
        std::env::remove_var("RATEWARDEN__LOGGING__LEVEL");
        std::fs::remove_file(&path).unwrap();

        assert_eq!(result.unwrap().logging.level, "trace");
    }

    #[test]
    fn test_from_missing_file() {
        assert!(matches!(
            WardenConfig::from_file("/nonexistent/ratewarden.yaml"),
            Err(RateLimitError::Config(_))
        ));
    }
}
