//! Simulated positional servo.

use rover_common::hal::config::DeviceConfig;
use rover_common::hal::element::{DeviceError, HardwareElement};
use rover_common::hal::types::{DeviceKind, Sample};

/// Servo that reaches its commanded position instantly.
#[derive(Debug, Clone)]
pub struct SimServo {
    name: String,
    position: f64,
}

impl SimServo {
    /// Servo from a roster entry.
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            name: config.name.clone(),
            position: config.initial_position.clamp(0.0, 1.0),
        }
    }

    /// Current position, `0.0..=1.0`.
    pub fn position(&self) -> f64 {
        self.position
    }
}

impl HardwareElement for SimServo {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::Servo
    }

    /// `[position]`
    fn sample(&mut self) -> Result<Sample, DeviceError> {
        Ok(vec![self.position])
    }

    fn command(&mut self, value: f64) -> Result<(), DeviceError> {
        if value.is_nan() {
            return Err(DeviceError::Io {
                name: self.name.clone(),
                message: "position command is NaN".to_string(),
            });
        }
        self.position = value.clamp(0.0, 1.0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rover_common::hal::types::RunMode;

    #[test]
    fn test_position_clamped() {
        let mut config = DeviceConfig::new("claw", DeviceKind::Servo);
        config.initial_position = 0.4;
        let mut servo = SimServo::new(&config);
        assert_eq!(servo.sample().unwrap(), vec![0.4]);

        servo.command(1.7).unwrap();
        assert_eq!(servo.position(), 1.0);
        servo.command(-0.2).unwrap();
        assert_eq!(servo.sample().unwrap(), vec![0.0]);
    }

    #[test]
    fn test_no_run_modes() {
        let mut servo = SimServo::new(&DeviceConfig::new("claw", DeviceKind::Servo));
        assert!(servo.set_run_mode(RunMode::StopAndResetEncoder).is_err());
    }
}
