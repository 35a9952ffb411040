//! Simulated distance sensor.
//!
//! The reading lives in a [`DistanceProbe`] shared with whatever drives the
//! simulation (a test, the CLI harness), since the sensor itself is owned
//! by the sync thread once the roster is built.

use rover_common::hal::config::DeviceConfig;
use rover_common::hal::element::{DeviceError, HardwareElement};
use rover_common::hal::types::{DeviceKind, Sample};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Handle that sets what the sensor reports.
#[derive(Debug, Clone)]
pub struct DistanceProbe {
    distance_bits: Arc<AtomicU64>,
    connected: Arc<AtomicBool>,
}

impl DistanceProbe {
    /// Set the simulated distance [mm].
    pub fn set_distance_mm(&self, millimetres: f64) {
        self.distance_bits
            .store(millimetres.max(0.0).to_bits(), Ordering::Release);
    }

    /// Current simulated distance [mm].
    pub fn distance_mm(&self) -> f64 {
        f64::from_bits(self.distance_bits.load(Ordering::Acquire))
    }

    /// Simulate unplugging (`false`) or re-plugging (`true`) the sensor.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }
}

/// Distance sensor reading from a shared probe.
#[derive(Debug)]
pub struct SimDistanceSensor {
    name: String,
    probe: DistanceProbe,
}

impl SimDistanceSensor {
    /// Sensor from a roster entry.
    pub fn new(config: &DeviceConfig) -> Self {
        let probe = DistanceProbe {
            distance_bits: Arc::new(AtomicU64::new(0)),
            connected: Arc::new(AtomicBool::new(true)),
        };
        probe.set_distance_mm(config.initial_mm);
        Self {
            name: config.name.clone(),
            probe,
        }
    }

    /// Handle for driving the simulated reading.
    pub fn probe(&self) -> DistanceProbe {
        self.probe.clone()
    }
}

impl HardwareElement for SimDistanceSensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::DistanceSensor
    }

    /// `[distance_mm]`
    fn sample(&mut self) -> Result<Sample, DeviceError> {
        if !self.probe.connected.load(Ordering::Acquire) {
            return Err(DeviceError::Disconnected {
                name: self.name.clone(),
            });
        }
        Ok(vec![self.probe.distance_mm()])
    }

    fn command(&mut self, _value: f64) -> Result<(), DeviceError> {
        Ok(())
    }
}
