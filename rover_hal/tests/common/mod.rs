//! Shared fixtures for sync thread integration tests.

#![allow(dead_code)]

use parking_lot::Mutex;
use rover_common::hal::element::{DeviceError, HardwareElement};
use rover_common::hal::types::{DeviceKind, RunMode, Sample};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Everything a [`RecordingDevice`] was asked to do.
#[derive(Debug, Default)]
pub struct Journal {
    pub samples: usize,
    pub commands: Vec<f64>,
    pub run_modes: Vec<RunMode>,
    pub teardowns: usize,
}

/// Device that records every call and reports a settable reading.
pub struct RecordingDevice {
    name: String,
    kind: DeviceKind,
    reading: Arc<AtomicU64>,
    fail_samples: bool,
    journal: Arc<Mutex<Journal>>,
}

/// Test-side view of a [`RecordingDevice`].
#[derive(Clone)]
pub struct Recorder {
    reading: Arc<AtomicU64>,
    journal: Arc<Mutex<Journal>>,
}

impl Recorder {
    pub fn set_reading(&self, value: f64) {
        self.reading.store(value.to_bits(), Ordering::Release);
    }

    pub fn samples(&self) -> usize {
        self.journal.lock().samples
    }

    pub fn commands(&self) -> Vec<f64> {
        self.journal.lock().commands.clone()
    }

    pub fn run_modes(&self) -> Vec<RunMode> {
        self.journal.lock().run_modes.clone()
    }

    pub fn teardowns(&self) -> usize {
        self.journal.lock().teardowns
    }
}

impl RecordingDevice {
    pub fn new(name: &str, kind: DeviceKind) -> (Box<dyn HardwareElement>, Recorder) {
        Self::build(name, kind, false)
    }

    /// Device whose every sample fails with `Disconnected`.
    pub fn failing(name: &str, kind: DeviceKind) -> (Box<dyn HardwareElement>, Recorder) {
        Self::build(name, kind, true)
    }

    fn build(name: &str, kind: DeviceKind, fail_samples: bool) -> (Box<dyn HardwareElement>, Recorder) {
        let recorder = Recorder {
            reading: Arc::new(AtomicU64::new(0.0f64.to_bits())),
            journal: Arc::new(Mutex::new(Journal::default())),
        };
        let device = RecordingDevice {
            name: name.to_string(),
            kind,
            reading: Arc::clone(&recorder.reading),
            fail_samples,
            journal: Arc::clone(&recorder.journal),
        };
        (Box::new(device), recorder)
    }
}

impl HardwareElement for RecordingDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DeviceKind {
        self.kind
    }

    fn sample(&mut self) -> Result<Sample, DeviceError> {
        self.journal.lock().samples += 1;
        if self.fail_samples {
            return Err(DeviceError::Disconnected {
                name: self.name.clone(),
            });
        }
        Ok(vec![f64::from_bits(self.reading.load(Ordering::Acquire))])
    }

    fn command(&mut self, value: f64) -> Result<(), DeviceError> {
        self.journal.lock().commands.push(value);
        Ok(())
    }

    fn set_run_mode(&mut self, mode: RunMode) -> Result<(), DeviceError> {
        self.journal.lock().run_modes.push(mode);
        Ok(())
    }

    fn teardown(&mut self) {
        self.journal.lock().teardowns += 1;
    }
}

/// Poll `condition` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}
