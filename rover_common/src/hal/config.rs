//! Roster and sync configuration.
//!
//! This module contains the configuration loaded from `roster.toml`:
//! - `RosterConfig` - Top-level file: shared settings, sync timing, devices
//! - `SyncConfig` - Cadence and startup timing of the sync thread
//! - `DeviceConfig` - One roster entry
//!
//! # TOML Example
//!
//! ```toml
//! [shared]
//! service_name = "rover-hal"
//!
//! [sync]
//! cadence_ms = 5
//! cadence_mode = "deadline"
//!
//! [[devices]]
//! name = "left_front"
//! kind = "motor"
//! reversed = true
//!
//! [[devices]]
//! name = "front_distance"
//! kind = "distance_sensor"
//! initial_mm = 300.0
//! ```

use crate::config::{ConfigError, ConfigLoader, SharedConfig};
use crate::consts::{
    DEFAULT_CADENCE_MS, DEFAULT_GRACE_DELAY_US, DEFAULT_STATS_LOG_INTERVAL, MAX_DEVICES,
};
use crate::hal::types::DeviceKind;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

fn default_cadence_ms() -> u64 {
    DEFAULT_CADENCE_MS
}

fn default_grace_delay_us() -> u64 {
    DEFAULT_GRACE_DELAY_US
}

fn default_stats_log_interval() -> u64 {
    DEFAULT_STATS_LOG_INTERVAL
}

/// goBILDA 5202 series, 19.2:1 gearbox.
fn default_ticks_per_rev() -> f64 {
    537.7
}

fn default_max_rpm() -> f64 {
    312.0
}

/// How the sync thread waits between cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CadenceMode {
    /// Block on a deadline; a stop request wakes the thread early.
    #[default]
    Deadline,
    /// Busy-poll the clock. Lowest jitter, costs one CPU core.
    Spin,
}

/// Sync thread timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Minimum interval between two cycles [ms].
    #[serde(default = "default_cadence_ms")]
    pub cadence_ms: u64,

    /// Delay applied by `start` before the clock is attached [µs].
    #[serde(default = "default_grace_delay_us")]
    pub grace_delay_us: u64,

    /// Wait strategy between cycles.
    #[serde(default)]
    pub cadence_mode: CadenceMode,

    /// Cycles between periodic statistics log lines.
    #[serde(default = "default_stats_log_interval")]
    pub stats_log_interval: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cadence_ms: DEFAULT_CADENCE_MS,
            grace_delay_us: DEFAULT_GRACE_DELAY_US,
            cadence_mode: CadenceMode::default(),
            stats_log_interval: DEFAULT_STATS_LOG_INTERVAL,
        }
    }
}

impl SyncConfig {
    /// Cadence as a `Duration`.
    pub fn cadence(&self) -> Duration {
        Duration::from_millis(self.cadence_ms)
    }

    /// Grace delay as a `Duration`.
    pub fn grace_delay(&self) -> Duration {
        Duration::from_micros(self.grace_delay_us)
    }

    /// Validate timing values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cadence_ms == 0 {
            return Err(ConfigError::ValidationError(
                "sync.cadence_ms must be greater than 0".to_string(),
            ));
        }
        if self.stats_log_interval == 0 {
            return Err(ConfigError::ValidationError(
                "sync.stats_log_interval must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// One roster entry. Kind-specific fields are ignored by other kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    /// Unique device name.
    pub name: String,

    /// Device type.
    pub kind: DeviceKind,

    /// Motor: encoder ticks per output shaft revolution.
    #[serde(default = "default_ticks_per_rev")]
    pub ticks_per_rev: f64,

    /// Motor: free speed at full power [rpm].
    #[serde(default = "default_max_rpm")]
    pub max_rpm: f64,

    /// Motor: invert the commanded power.
    #[serde(default)]
    pub reversed: bool,

    /// Distance sensor: reading before anything moves [mm].
    #[serde(default)]
    pub initial_mm: f64,

    /// Servo: position before the first command, 0.0..=1.0.
    #[serde(default)]
    pub initial_position: f64,
}

impl DeviceConfig {
    /// Config entry with every optional field at its default.
    pub fn new(name: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ticks_per_rev: default_ticks_per_rev(),
            max_rpm: default_max_rpm(),
            reversed: false,
            initial_mm: 0.0,
            initial_position: 0.0,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "device name cannot be empty".to_string(),
            ));
        }
        match self.kind {
            DeviceKind::Motor => {
                if !(self.ticks_per_rev > 0.0) || !(self.max_rpm > 0.0) {
                    return Err(ConfigError::ValidationError(format!(
                        "motor '{}': ticks_per_rev and max_rpm must be positive",
                        self.name
                    )));
                }
            }
            DeviceKind::Servo => {
                if !(0.0..=1.0).contains(&self.initial_position) {
                    return Err(ConfigError::ValidationError(format!(
                        "servo '{}': initial_position {} outside 0.0..=1.0",
                        self.name, self.initial_position
                    )));
                }
            }
            DeviceKind::DistanceSensor => {
                if self.initial_mm < 0.0 {
                    return Err(ConfigError::ValidationError(format!(
                        "distance sensor '{}': initial_mm must not be negative",
                        self.name
                    )));
                }
            }
            DeviceKind::ThreeWheelOdometry => {}
        }
        Ok(())
    }
}

/// Main configuration loaded from `roster.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RosterConfig {
    /// Service name and log level.
    pub shared: SharedConfig,

    /// Sync thread timing.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Devices in slot order.
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

impl RosterConfig {
    /// Load and validate a roster file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config = <Self as ConfigLoader>::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate an in-memory roster document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config = <Self as ConfigLoader>::parse(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the roster configuration.
    ///
    /// # Validation Rules
    /// 1. `shared.service_name` not empty
    /// 2. `sync` timing values positive
    /// 3. 1 ..= `MAX_DEVICES` devices
    /// 4. Device names non-empty and unique
    /// 5. Kind-specific parameters in range
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.sync.validate()?;

        if self.devices.is_empty() {
            return Err(ConfigError::ValidationError(
                "roster must contain at least one device".to_string(),
            ));
        }
        if self.devices.len() > MAX_DEVICES {
            return Err(ConfigError::ValidationError(format!(
                "Too many devices: {} (max {})",
                self.devices.len(),
                MAX_DEVICES
            )));
        }

        let mut names = HashSet::new();
        for device in &self.devices {
            device.validate()?;
            if !names.insert(device.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "Duplicate device name: {}",
                    device.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[shared]
service_name = "rover-test"

[[devices]]
name = "arm"
kind = "motor"
"#;

    #[test]
    fn test_sync_defaults_applied() {
        let config = RosterConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.sync, SyncConfig::default());
        assert_eq!(config.sync.cadence(), Duration::from_millis(5));
        assert_eq!(config.sync.cadence_mode, CadenceMode::Deadline);
        assert_eq!(config.devices[0].ticks_per_rev, 537.7);
    }

    #[test]
    fn test_zero_cadence_rejected() {
        let doc = format!("{MINIMAL}\n[sync]\ncadence_ms = 0\n");
        assert!(matches!(
            RosterConfig::from_toml_str(&doc),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_servo_position_range() {
        let mut servo = DeviceConfig::new("claw", DeviceKind::Servo);
        servo.initial_position = 1.5;
        assert!(servo.validate().is_err());
        servo.initial_position = 1.0;
        assert!(servo.validate().is_ok());
    }

    #[test]
    fn test_motor_needs_positive_ticks() {
        let mut motor = DeviceConfig::new("lift", DeviceKind::Motor);
        motor.ticks_per_rev = 0.0;
        assert!(motor.validate().is_err());
        motor.ticks_per_rev = f64::NAN;
        assert!(motor.validate().is_err());
    }
}
