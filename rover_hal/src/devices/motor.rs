//! Simulated DC motor with quadrature encoder.
//!
//! Power is a fraction of free speed in `-1.0..=1.0`. The encoder integrates
//! `power * max_ticks_per_sec` over wall time whenever the hub cache is
//! refreshed, so reads taken in the same bulk generation agree.

use super::bulk::{BulkHub, CachedRead};
use rover_common::hal::config::DeviceConfig;
use rover_common::hal::element::{DeviceError, HardwareElement};
use rover_common::hal::types::{DeviceKind, RunMode, Sample};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Simulated motor on a bulk-cached hub.
#[derive(Debug)]
pub struct SimMotor {
    name: String,
    hub: Arc<BulkHub>,
    max_ticks_per_sec: f64,
    reversed: bool,
    power: f64,
    mode: RunMode,
    encoder_ticks: f64,
    last_update: Instant,
    cache: CachedRead<[f64; 2]>,
}

impl SimMotor {
    /// Motor from a roster entry.
    pub fn new(config: &DeviceConfig, hub: Arc<BulkHub>) -> Self {
        Self {
            name: config.name.clone(),
            hub,
            max_ticks_per_sec: config.max_rpm / 60.0 * config.ticks_per_rev,
            reversed: config.reversed,
            power: 0.0,
            mode: RunMode::RunUsingEncoder,
            encoder_ticks: 0.0,
            last_update: Instant::now(),
            cache: CachedRead::new([0.0, 0.0]),
        }
    }

    /// Last applied power, after direction inversion.
    pub fn power(&self) -> f64 {
        self.power
    }

    /// Current controller mode.
    pub fn run_mode(&self) -> RunMode {
        self.mode
    }

    /// Free speed [ticks/s].
    pub fn max_ticks_per_sec(&self) -> f64 {
        self.max_ticks_per_sec
    }

    fn velocity(&self) -> f64 {
        match self.mode {
            RunMode::StopAndResetEncoder => 0.0,
            RunMode::RunUsingEncoder | RunMode::RunWithoutEncoder => {
                self.power * self.max_ticks_per_sec
            }
        }
    }

    fn integrate(&mut self) -> [f64; 2] {
        let now = Instant::now();
        let dt = now.duration_since(self.last_update).as_secs_f64();
        self.last_update = now;

        let velocity = self.velocity();
        self.encoder_ticks += velocity * dt;
        [self.encoder_ticks.round(), velocity]
    }
}

impl HardwareElement for SimMotor {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::Motor
    }

    /// `[encoder_ticks, ticks_per_second]`
    fn sample(&mut self) -> Result<Sample, DeviceError> {
        let generation = self.hub.read_generation();
        if self.cache.is_stale(generation) {
            let reading = self.integrate();
            self.cache.store(generation, reading);
        }
        Ok(self.cache.value().to_vec())
    }

    fn command(&mut self, value: f64) -> Result<(), DeviceError> {
        if value.is_nan() {
            return Err(DeviceError::Io {
                name: self.name.clone(),
                message: "power command is NaN".to_string(),
            });
        }
        // Settle the encoder at the old power before switching.
        self.integrate();
        let power = value.clamp(-1.0, 1.0);
        self.power = if self.reversed { -power } else { power };
        Ok(())
    }

    fn set_run_mode(&mut self, mode: RunMode) -> Result<(), DeviceError> {
        self.integrate();
        if mode == RunMode::StopAndResetEncoder {
            self.power = 0.0;
            self.encoder_ticks = 0.0;
        }
        debug!("Motor '{}' run mode {:?} -> {:?}", self.name, self.mode, mode);
        self.mode = mode;
        Ok(())
    }
}
