//! Device slot types.
//!
//! - `DeviceKind` - Closed set of supported device types
//! - `Classification` - Sensor or actuator; decides whether commands apply
//! - `DeviceSlot` - One roster position
//! - `RunMode` - Motor controller modes used by the actuator reset sequence

use serde::{Deserialize, Serialize};
use std::fmt;

/// A sampled device reading. Devices may report several values per read.
pub type Sample = Vec<f64>;

/// Supported device types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// DC motor with quadrature encoder and closed-loop controller.
    Motor,
    /// Positional servo.
    Servo,
    /// Time-of-flight or ultrasonic distance sensor.
    DistanceSensor,
    /// Dead-wheel odometry pod set (two parallel, one perpendicular).
    ThreeWheelOdometry,
}

impl DeviceKind {
    /// Whether teardown must re-zero the encoder and re-arm closed-loop control.
    pub fn requires_closed_loop_reset(self) -> bool {
        match self {
            DeviceKind::Motor => true,
            DeviceKind::Servo | DeviceKind::DistanceSensor | DeviceKind::ThreeWheelOdometry => {
                false
            }
        }
    }

    /// Classification a device of this kind reports unless configured otherwise.
    pub fn default_classification(self) -> Classification {
        match self {
            DeviceKind::Motor | DeviceKind::Servo => Classification::Actuator,
            DeviceKind::DistanceSensor | DeviceKind::ThreeWheelOdometry => Classification::Sensor,
        }
    }

    /// Name as written in roster TOML.
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceKind::Motor => "motor",
            DeviceKind::Servo => "servo",
            DeviceKind::DistanceSensor => "distance_sensor",
            DeviceKind::ThreeWheelOdometry => "three_wheel_odometry",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a slot's command is ever applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Read-only device; commands are never applied.
    Sensor,
    /// Commandable device.
    Actuator,
}

impl Classification {
    /// True for `Sensor`.
    pub fn is_sensor(self) -> bool {
        matches!(self, Classification::Sensor)
    }
}

/// One roster position. Immutable after roster construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSlot {
    /// Index into every shared array.
    pub index: usize,
    /// Device type tag.
    pub kind: DeviceKind,
    /// Sensor or actuator.
    pub classification: Classification,
}

/// Motor controller run modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Stop the motor and zero the encoder count.
    StopAndResetEncoder,
    /// Closed-loop velocity control using encoder feedback.
    RunUsingEncoder,
    /// Open-loop power control.
    RunWithoutEncoder,
}
