//! Device capability contract and error types.
//!
//! This module defines:
//! - `HardwareElement` trait - What the sync core needs from every device
//! - `DeviceError` enum - Failures reported by device adapters
//! - `HalError` enum - Failures of the HAL itself (config, roster, thread)

use crate::config::ConfigError;
use crate::hal::types::{Classification, DeviceKind, RunMode, Sample};
use thiserror::Error;

/// Failures reported by a device adapter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeviceError {
    /// Device did not answer (unplugged, hub reset).
    #[error("Device '{name}' disconnected")]
    Disconnected {
        /// Device name
        name: String,
    },

    /// Operation not supported by this device type.
    #[error("Device '{name}' does not support {operation}")]
    Unsupported {
        /// Device name
        name: String,
        /// Operation attempted
        operation: &'static str,
    },

    /// Bus or transport failure.
    #[error("I/O error on device '{name}': {message}")]
    Io {
        /// Device name
        name: String,
        /// Transport-specific detail
        message: String,
    },
}

/// Error types for HAL operations.
#[derive(Debug, Clone, Error)]
pub enum HalError {
    /// Startup could not complete.
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// No factory registered for a device kind.
    #[error("No device factory registered for kind: {0}")]
    DeviceNotFound(DeviceKind),

    /// Shared store length does not match the roster.
    #[error("Size mismatch: roster has {expected} devices, store has {actual} slots")]
    SizeMismatch {
        /// Roster length
        expected: usize,
        /// Store length
        actual: usize,
    },

    /// Device failure surfaced outside the sync cycle.
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// The sync thread panicked.
    #[error("Sync thread panicked: {0}")]
    ThreadPanicked(String),
}

impl From<ConfigError> for HalError {
    fn from(err: ConfigError) -> Self {
        HalError::ConfigError(err.to_string())
    }
}

/// Trait every managed device satisfies.
///
/// The sync thread owns all devices for the lifetime of a run. Control logic
/// never calls these methods directly; it exchanges values through the
/// shared store instead.
///
/// # Lifecycle
///
/// 1. `sample()` - Called every cycle while the slot's change flag is set
/// 2. `command()` - Called every cycle while the flag is set, actuators only
/// 3. `teardown()` - Called exactly once when the sync thread terminates
/// 4. `set_run_mode()` - Called after teardown for kinds that need the
///    closed-loop reset sequence
pub trait HardwareElement: Send {
    /// Device name from the roster configuration.
    fn name(&self) -> &str;

    /// Device type tag.
    fn kind(&self) -> DeviceKind;

    /// Sensor or actuator. Defaults to the kind's classification.
    fn classification(&self) -> Classification {
        self.kind().default_classification()
    }

    /// Read the device's current raw value(s).
    fn sample(&mut self) -> Result<Sample, DeviceError>;

    /// Apply one commanded value.
    fn command(&mut self, value: f64) -> Result<(), DeviceError>;

    /// Switch the device's controller mode.
    ///
    /// Default: unsupported.
    fn set_run_mode(&mut self, _mode: RunMode) -> Result<(), DeviceError> {
        Err(DeviceError::Unsupported {
            name: self.name().to_string(),
            operation: "set_run_mode",
        })
    }

    /// Release per-device background resources.
    ///
    /// Default: nothing to release.
    fn teardown(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        last: f64,
    }

    impl HardwareElement for Probe {
        fn name(&self) -> &str {
            "probe"
        }

        fn kind(&self) -> DeviceKind {
            DeviceKind::Servo
        }

        fn sample(&mut self) -> Result<Sample, DeviceError> {
            Ok(vec![self.last])
        }

        fn command(&mut self, value: f64) -> Result<(), DeviceError> {
            self.last = value;
            Ok(())
        }
    }

    #[test]
    fn test_defaults_follow_kind() {
        let mut probe = Probe { last: 0.0 };
        assert_eq!(probe.classification(), Classification::Actuator);
        probe.command(0.25).unwrap();
        assert_eq!(probe.sample().unwrap(), vec![0.25]);
    }

    #[test]
    fn test_default_run_mode_is_unsupported() {
        let mut probe = Probe { last: 0.0 };
        let err = probe.set_run_mode(RunMode::RunUsingEncoder).unwrap_err();
        assert!(matches!(err, DeviceError::Unsupported { operation: "set_run_mode", .. }));
        assert!(err.to_string().contains("probe"));
    }

    #[test]
    fn test_hal_error_display() {
        let err = HalError::SizeMismatch {
            expected: 3,
            actual: 2,
        };
        assert!(err.to_string().contains("3"));

        let err: HalError = ConfigError::FileNotFound.into();
        assert!(matches!(err, HalError::ConfigError(_)));

        let err = HalError::DeviceNotFound(DeviceKind::Servo);
        assert!(err.to_string().contains("servo"));
    }
}
