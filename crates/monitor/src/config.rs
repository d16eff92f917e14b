//! Monitor configuration.

use serde::{Deserialize, Serialize};
use vigil_progress::{DEFAULT_CAPACITY_THRESHOLD, DEFAULT_HISTORY_CAPACITY, DEFAULT_STALL_THRESHOLD_HOURS};
use vigil_quality::{DEFAULT_COMPLETION_THRESHOLD, DEFAULT_COOLDOWN_HOURS, DEFAULT_DAILY_RATE};

use crate::error::{MonitorError, Result};

/// Default seconds between monitoring cycles.
pub const DEFAULT_CHECK_INTERVAL_SECONDS: u64 = 900;

const MAX_INTERVAL_SECONDS: u64 = 365 * 24 * 60 * 60;
const MAX_THRESHOLD_HOURS: u64 = 100 * 365 * 24;

/// Configuration for a project monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Seconds between cycles
    pub check_interval_seconds: u64,
    /// Hours without an update before an in-progress task is stalled
    pub stall_threshold_hours: u64,
    /// In-progress tasks allowed before capacity is overloaded
    pub capacity_threshold: usize,
    /// Progress percentage that counts as complete
    pub completion_threshold_percent: f64,
    /// Cost per team member per day
    pub daily_rate: f64,
    /// Hours to suppress repeated completion triggers
    pub completion_cooldown_hours: u64,
    /// Maximum history entries retained
    pub history_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval_seconds: DEFAULT_CHECK_INTERVAL_SECONDS,
            stall_threshold_hours: DEFAULT_STALL_THRESHOLD_HOURS,
            capacity_threshold: DEFAULT_CAPACITY_THRESHOLD,
            completion_threshold_percent: DEFAULT_COMPLETION_THRESHOLD,
            daily_rate: DEFAULT_DAILY_RATE,
            completion_cooldown_hours: DEFAULT_COOLDOWN_HOURS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl MonitorConfig {
    /// Parse a JSON document. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| MonitorError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every threshold is usable.
    pub fn validate(&self) -> Result<()> {
        if self.check_interval_seconds == 0 || self.check_interval_seconds > MAX_INTERVAL_SECONDS {
            return Err(MonitorError::Configuration(format!(
                "check_interval_seconds must be between 1 and {}, got {}",
                MAX_INTERVAL_SECONDS, self.check_interval_seconds
            )));
        }
        if self.stall_threshold_hours == 0 || self.stall_threshold_hours > MAX_THRESHOLD_HOURS {
            return Err(MonitorError::Configuration(format!(
                "stall_threshold_hours must be between 1 and {}, got {}",
                MAX_THRESHOLD_HOURS, self.stall_threshold_hours
            )));
        }
        if !self.completion_threshold_percent.is_finite()
            || self.completion_threshold_percent <= 0.0
            || self.completion_threshold_percent > 100.0
        {
            return Err(MonitorError::Configuration(format!(
                "completion_threshold_percent must be in (0, 100], got {}",
                self.completion_threshold_percent
            )));
        }
        if !self.daily_rate.is_finite() || self.daily_rate < 0.0 {
            return Err(MonitorError::Configuration(format!(
                "daily_rate must be a non-negative number, got {}",
                self.daily_rate
            )));
        }
        if self.completion_cooldown_hours == 0 || self.completion_cooldown_hours > MAX_THRESHOLD_HOURS {
            return Err(MonitorError::Configuration(format!(
                "completion_cooldown_hours must be between 1 and {}, got {}",
                MAX_THRESHOLD_HOURS, self.completion_cooldown_hours
            )));
        }
        if self.history_capacity == 0 {
            return Err(MonitorError::Configuration(
                "history_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.check_interval_seconds, 900);
        assert_eq!(config.stall_threshold_hours, 24);
        assert_eq!(config.capacity_threshold, 10);
        assert_eq!(config.completion_threshold_percent, 95.0);
        assert_eq!(config.daily_rate, 1000.0);
        assert_eq!(config.completion_cooldown_hours, 24);
        assert_eq!(config.history_capacity, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config = MonitorConfig::from_json_str(r#"{ "check_interval_seconds": 60 }"#).unwrap();
        assert_eq!(config.check_interval_seconds, 60);
        assert_eq!(config.capacity_threshold, 10);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let cases = [
            MonitorConfig { check_interval_seconds: 0, ..Default::default() },
            MonitorConfig { stall_threshold_hours: 0, ..Default::default() },
            MonitorConfig { completion_threshold_percent: 0.0, ..Default::default() },
            MonitorConfig { completion_threshold_percent: 120.0, ..Default::default() },
            MonitorConfig { completion_threshold_percent: f64::NAN, ..Default::default() },
            MonitorConfig { daily_rate: -1.0, ..Default::default() },
            MonitorConfig { completion_cooldown_hours: 0, ..Default::default() },
            MonitorConfig { history_capacity: 0, ..Default::default() },
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(MonitorError::Configuration(_))),
                "accepted {:?}",
                config
            );
        }
    }

    #[test]
    fn test_malformed_json_is_configuration_error() {
        assert!(matches!(
            MonitorConfig::from_json_str(r#"{ "daily_rate": "lots" }"#),
            Err(MonitorError::Configuration(_))
        ));
    }
}
