//! Configuration management for the gate.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Values that are present but malformed are errors, never silently replaced.

use crate::audit::{DEFAULT_FRAUD_ALERTS, DEFAULT_RECENT_CHECK_INS};
use crate::validation::{GuardEnvironment, InvalidScanPolicy};
use serde::{Deserialize, Serialize};
use std::env;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("Invalid value for {var}: {value:?} ({expected})")]
    Invalid {
        /// Variable name
        var: &'static str,
        /// Raw value
        value: String,
        /// What was expected
        expected: &'static str,
    },

    /// Venue capacity must be positive
    #[error("TICKET_GUARD_VENUE_CAPACITY must be greater than zero")]
    ZeroCapacity,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Gate configuration
    pub gate: GateConfig,
    /// Dashboard view configuration
    pub dashboard: DashboardConfig,
    /// Scanner front-end configuration
    pub scanner: ScannerConfig,
}

/// Gate configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Dataset file; the bundled seed data when unset
    pub dataset: Option<PathBuf>,
    /// Entrance written into check-in entries
    pub entrance: String,
    /// Location written into fraud entries
    pub location: String,
    /// Handling of unknown codes
    pub invalid_scan_policy: InvalidScanPolicy,
    /// Venue capacity for the utilization view
    pub venue_capacity: NonZeroU32,
}

/// Dashboard view configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Rows in the recent check-ins view
    pub recent_check_ins_limit: usize,
    /// Rows in the fraud alerts view
    pub fraud_alerts_limit: usize,
}

/// Scanner front-end configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Simulated camera/decoder delay before each scan, in milliseconds
    pub scan_latency_ms: u64,
}

impl ScannerConfig {
    /// Simulated scan delay
    #[must_use]
    pub const fn scan_latency(&self) -> Duration {
        Duration::from_millis(self.scan_latency_ms)
    }
}

/// Default venue capacity
pub const DEFAULT_VENUE_CAPACITY: u32 = 5000;

/// Default simulated scan delay in milliseconds
pub const DEFAULT_SCAN_LATENCY_MS: u64 = 500;

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to a malformed value or
    /// the venue capacity is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration from any variable source.
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let invalid_scan_policy = match lookup("TICKET_GUARD_INVALID_SCAN_POLICY") {
            None => InvalidScanPolicy::default(),
            Some(value) => match value.trim().to_lowercase().as_str() {
                "record" => InvalidScanPolicy::Record,
                "discard" => InvalidScanPolicy::Discard,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "TICKET_GUARD_INVALID_SCAN_POLICY",
                        value,
                        expected: "record or discard",
                    });
                },
            },
        };

        let venue_capacity = parse(
            &lookup,
            "TICKET_GUARD_VENUE_CAPACITY",
            DEFAULT_VENUE_CAPACITY,
            "an unsigned integer",
        )?;
        let venue_capacity = NonZeroU32::new(venue_capacity).ok_or(ConfigError::ZeroCapacity)?;

        Ok(Self {
            gate: GateConfig {
                dataset: lookup("TICKET_GUARD_DATASET")
                    .filter(|path| !path.trim().is_empty())
                    .map(PathBuf::from),
                entrance: lookup("TICKET_GUARD_ENTRANCE")
                    .unwrap_or_else(|| GuardEnvironment::DEFAULT_ENTRANCE.to_string()),
                location: lookup("TICKET_GUARD_LOCATION")
                    .unwrap_or_else(|| GuardEnvironment::DEFAULT_LOCATION.to_string()),
                invalid_scan_policy,
                venue_capacity,
            },
            dashboard: DashboardConfig {
                recent_check_ins_limit: parse(
                    &lookup,
                    "RECENT_CHECK_INS_LIMIT",
                    DEFAULT_RECENT_CHECK_INS,
                    "an unsigned integer",
                )?,
                fraud_alerts_limit: parse(
                    &lookup,
                    "FRAUD_ALERTS_LIMIT",
                    DEFAULT_FRAUD_ALERTS,
                    "an unsigned integer",
                )?,
            },
            scanner: ScannerConfig {
                scan_latency_ms: parse(
                    &lookup,
                    "SCAN_LATENCY_MS",
                    DEFAULT_SCAN_LATENCY_MS,
                    "milliseconds as an unsigned integer",
                )?,
            },
        })
    }

    /// Apply the gate settings to a validation environment
    #[must_use]
    pub fn apply_to(&self, env: GuardEnvironment) -> GuardEnvironment {
        env.with_entrance(self.gate.entrance.clone())
            .with_location(self.gate.location.clone())
            .with_invalid_scan_policy(self.gate.invalid_scan_policy)
    }
}

fn parse<F, T>(
    lookup: &F,
    var: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid {
                var,
                value,
                expected,
            }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.gate.dataset, None);
        assert_eq!(config.gate.entrance, "Main");
        assert_eq!(config.gate.location, "Main Entrance");
        assert_eq!(config.gate.invalid_scan_policy, InvalidScanPolicy::Record);
        assert_eq!(config.gate.venue_capacity.get(), 5000);
        assert_eq!(config.dashboard.recent_check_ins_limit, 10);
        assert_eq!(config.dashboard.fraud_alerts_limit, 5);
        assert_eq!(config.scanner.scan_latency(), Duration::from_millis(500));
    }

    #[test]
    fn overrides() {
        let config = load(&[
            ("TICKET_GUARD_DATASET", "/data/event.json"),
            ("TICKET_GUARD_ENTRANCE", "VIP"),
            ("TICKET_GUARD_INVALID_SCAN_POLICY", "Discard"),
            ("TICKET_GUARD_VENUE_CAPACITY", " 1200 "),
            ("SCAN_LATENCY_MS", "0"),
            ("FRAUD_ALERTS_LIMIT", "20"),
        ])
        .unwrap();
        assert_eq!(config.gate.dataset, Some(PathBuf::from("/data/event.json")));
        assert_eq!(config.gate.entrance, "VIP");
        assert_eq!(config.gate.invalid_scan_policy, InvalidScanPolicy::Discard);
        assert_eq!(config.gate.venue_capacity.get(), 1200);
        assert_eq!(config.scanner.scan_latency_ms, 0);
        assert_eq!(config.dashboard.fraud_alerts_limit, 20);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert_eq!(
            load(&[("TICKET_GUARD_VENUE_CAPACITY", "0")]),
            Err(ConfigError::ZeroCapacity)
        );
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let error = load(&[("SCAN_LATENCY_MS", "fast")]).unwrap_err();
        assert!(matches!(error, ConfigError::Invalid { var: "SCAN_LATENCY_MS", .. }));

        let error = load(&[("TICKET_GUARD_VENUE_CAPACITY", "-5")]).unwrap_err();
        assert!(matches!(
            error,
            ConfigError::Invalid {
                var: "TICKET_GUARD_VENUE_CAPACITY",
                ..
            }
        ));
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let error = load(&[("TICKET_GUARD_INVALID_SCAN_POLICY", "ignore")]).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Invalid value for TICKET_GUARD_INVALID_SCAN_POLICY: \"ignore\" (record or discard)"
        );
    }

    #[test]
    fn config_shapes_the_environment() {
        use ticket_guard_testing::{SequentialIdGenerator, test_clock};
        use std::sync::Arc;

        let config = load(&[
            ("TICKET_GUARD_LOCATION", "North Gate"),
            ("TICKET_GUARD_INVALID_SCAN_POLICY", "discard"),
        ])
        .unwrap();
        let env = config.apply_to(GuardEnvironment::new(
            Arc::new(test_clock()),
            Arc::new(SequentialIdGenerator::new()),
        ));
        assert_eq!(env.entrance, "Main");
        assert_eq!(env.location, "North Gate");
        assert_eq!(env.invalid_scan_policy, InvalidScanPolicy::Discard);
    }
}
