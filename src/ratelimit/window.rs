//! Window durations and their string grammar.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{RateLimitError, Result};

static WINDOW_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)([smhd])$").expect("window pattern is valid"));

/// Unit suffix of a window string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// `s`
    Second,
    /// `m`
    Minute,
    /// `h`
    Hour,
    /// `d`
    Day,
}

impl TimeUnit {
    /// Length of one unit in milliseconds.
    pub fn millis(&self) -> u64 {
        match self {
            TimeUnit::Second => 1_000,
            TimeUnit::Minute => 60_000,
            TimeUnit::Hour => 3_600_000,
            TimeUnit::Day => 86_400_000,
        }
    }

    /// The grammar suffix for this unit.
    pub fn suffix(&self) -> char {
        match self {
            TimeUnit::Second => 's',
            TimeUnit::Minute => 'm',
            TimeUnit::Hour => 'h',
            TimeUnit::Day => 'd',
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "s" => Some(TimeUnit::Second),
            "m" => Some(TimeUnit::Minute),
            "h" => Some(TimeUnit::Hour),
            "d" => Some(TimeUnit::Day),
            _ => None,
        }
    }
}

/// A positive window length parsed from `<digits><s|m|h|d>`.
///
/// Parsing happens once at the configuration boundary; the limiters only
/// ever see the millisecond value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WindowDuration {
    amount: u64,
    unit: TimeUnit,
    millis: u64,
}

impl WindowDuration {
    /// Build a window from an amount and unit.
    pub fn new(amount: u64, unit: TimeUnit) -> Result<Self> {
        if amount == 0 {
            return Err(RateLimitError::Configuration(
                "window duration must be greater than zero".to_string(),
            ));
        }

        let millis = amount.checked_mul(unit.millis()).ok_or_else(|| {
            RateLimitError::Configuration(format!(
                "window duration {}{} is too large",
                amount,
                unit.suffix()
            ))
        })?;

        Ok(Self {
            amount,
            unit,
            millis,
        })
    }

    /// Parse a window string such as `"30s"` or `"1h"`.
    pub fn parse(input: &str) -> Result<Self> {
        let captures = WINDOW_PATTERN.captures(input).ok_or_else(|| {
            RateLimitError::Configuration(format!(
                "invalid window duration '{}': expected <integer><s|m|h|d>",
                input
            ))
        })?;

        let amount: u64 = captures[1].parse().map_err(|_| {
            RateLimitError::Configuration(format!("window duration '{}' is too large", input))
        })?;
        let unit = TimeUnit::from_suffix(&captures[2]).ok_or_else(|| {
            RateLimitError::Configuration(format!("unknown time unit in '{}'", input))
        })?;

        Self::new(amount, unit)
    }

    /// Number of units.
    pub fn amount(&self) -> u64 {
        self.amount
    }

    /// The unit.
    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Window length in milliseconds. Always non-zero.
    pub fn as_millis(&self) -> u64 {
        self.millis
    }

    /// Window length as a [`Duration`].
    pub fn as_duration(&self) -> Duration {
        Duration::from_millis(self.millis)
    }
}

impl FromStr for WindowDuration {
    type Err = RateLimitError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for WindowDuration {
    type Error = RateLimitError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<WindowDuration> for String {
    fn from(window: WindowDuration) -> Self {
        window.to_string()
    }
}

impl fmt::Display for WindowDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_unit_millis() {
        assert_eq!(TimeUnit::Second.millis(), 1_000);
        assert_eq!(TimeUnit::Minute.millis(), 60_000);
        assert_eq!(TimeUnit::Hour.millis(), 3_600_000);
        assert_eq!(TimeUnit::Day.millis(), 86_400_000);
    }

    #[test]
    fn test_parse_each_unit() {
        assert_eq!(WindowDuration::parse("30s").unwrap().as_millis(), 30_000);
        assert_eq!(WindowDuration::parse("15m").unwrap().as_millis(), 900_000);
        assert_eq!(WindowDuration::parse("1h").unwrap().as_duration(), Duration::from_secs(3600));
        assert_eq!(WindowDuration::parse("2d").unwrap().unit(), TimeUnit::Day);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in ["5x", "", "h", "1.5h", "-1s", " 1s", "1s ", "1hh", "1H", "10 m"] {
            let err = WindowDuration::parse(input).unwrap_err();
            assert!(
                matches!(err, RateLimitError::Configuration(_)),
                "'{}' should be a configuration error",
                input
            );
        }
    }

    #[test]
    fn test_parse_rejects_zero() {
        assert!(matches!(
            WindowDuration::parse("0s"),
            Err(RateLimitError::Configuration(_))
        ));
    }

    #[test]
    fn test_parse_rejects_overflow() {
        assert!(WindowDuration::parse("99999999999999999999d").is_err());
        assert!(WindowDuration::parse("18446744073709551d").is_err());
    }

    #[test]
    fn test_display_is_canonical() {
        let window: WindowDuration = "45m".parse().unwrap();
        assert_eq!(window.to_string(), "45m");
        assert_eq!(window.amount(), 45);
    }

    #[test]
    fn test_deserialize_from_yaml_string() {
        let window: WindowDuration = serde_yaml::from_str("\"10s\"").unwrap();
        assert_eq!(window.as_millis(), 10_000);

        let bad: std::result::Result<WindowDuration, _> = serde_yaml::from_str("\"10y\"");
        assert!(bad.is_err());
    }
}
