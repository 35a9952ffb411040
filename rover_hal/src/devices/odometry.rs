//! Simulated three-wheel odometry.
//!
//! The device reports a field-frame pose. A background tracker thread
//! integrates the body-frame twist supplied through an [`OdometryHandle`],
//! standing in for the dead-wheel encoders of a real pod set. The tracker
//! is the per-device background resource released by `teardown()`.

use parking_lot::Mutex;
use rover_common::hal::config::DeviceConfig;
use rover_common::hal::element::{DeviceError, HalError, HardwareElement};
use rover_common::hal::types::{DeviceKind, Sample};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Tracker integration period.
const TRACKER_PERIOD: Duration = Duration::from_millis(10);

/// Field-frame pose. Heading in radians, counter-clockwise positive.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pose {
    /// X position [field units].
    pub x: f64,
    /// Y position [field units].
    pub y: f64,
    /// Heading [rad].
    pub heading: f64,
}

/// Body-frame velocity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Twist {
    /// Along the robot's heading [units/s].
    pub forward: f64,
    /// To the robot's left [units/s].
    pub strafe: f64,
    /// Counter-clockwise [rad/s].
    pub turn: f64,
}

/// Advance `pose` by `twist` over `dt` seconds, rotating at mid-step heading.
pub fn advance(pose: Pose, twist: Twist, dt: f64) -> Pose {
    let mid_heading = pose.heading + twist.turn * dt / 2.0;
    let (sin, cos) = mid_heading.sin_cos();
    Pose {
        x: pose.x + (twist.forward * cos - twist.strafe * sin) * dt,
        y: pose.y + (twist.forward * sin + twist.strafe * cos) * dt,
        heading: pose.heading + twist.turn * dt,
    }
}

#[derive(Debug, Default)]
struct OdometryState {
    pose: Mutex<Pose>,
    twist: Mutex<Twist>,
}

/// Handle for driving and observing the simulated odometry.
#[derive(Debug, Clone)]
pub struct OdometryHandle {
    state: Arc<OdometryState>,
}

impl OdometryHandle {
    /// Set the body velocity the tracker integrates.
    pub fn set_twist(&self, twist: Twist) {
        *self.state.twist.lock() = twist;
    }

    /// Current pose.
    pub fn pose(&self) -> Pose {
        *self.state.pose.lock()
    }

    /// Overwrite the pose (relocalisation).
    pub fn set_position(&self, pose: Pose) {
        *self.state.pose.lock() = pose;
    }
}

struct PoseTracker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PoseTracker {
    fn spawn(name: &str, state: Arc<OdometryState>) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name(format!("odo-{name}"))
            .spawn(move || {
                let mut last = Instant::now();
                while !stop_flag.load(Ordering::Acquire) {
                    thread::park_timeout(TRACKER_PERIOD);
                    let now = Instant::now();
                    let dt = now.duration_since(last).as_secs_f64();
                    last = now;

                    let twist = *state.twist.lock();
                    let mut pose = state.pose.lock();
                    *pose = advance(*pose, twist, dt);
                }
            })?;
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            if handle.join().is_err() {
                warn!("Pose tracker thread panicked");
            }
        }
    }

    fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for PoseTracker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Three dead-wheel odometry pods reporting `[x, y, heading]`.
pub struct ThreeWheelOdometry {
    name: String,
    state: Arc<OdometryState>,
    tracker: PoseTracker,
}

impl ThreeWheelOdometry {
    /// Odometry from a roster entry; starts the pose tracker.
    pub fn new(config: &DeviceConfig) -> Result<Self, HalError> {
        let state = Arc::new(OdometryState::default());
        let tracker = PoseTracker::spawn(&config.name, Arc::clone(&state)).map_err(|e| {
            HalError::InitFailed(format!(
                "odometry '{}': failed to spawn pose tracker: {}",
                config.name, e
            ))
        })?;
        debug!("Odometry '{}' pose tracker started", config.name);
        Ok(Self {
            name: config.name.clone(),
            state,
            tracker,
        })
    }

    /// Handle sharing this device's pose and twist.
    pub fn handle(&self) -> OdometryHandle {
        OdometryHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// Current pose.
    pub fn position(&self) -> Pose {
        *self.state.pose.lock()
    }

    /// Overwrite the pose.
    pub fn set_position(&self, pose: Pose) {
        *self.state.pose.lock() = pose;
    }

    /// Whether the background tracker is still running.
    pub fn is_tracking(&self) -> bool {
        self.tracker.is_running()
    }
}

impl HardwareElement for ThreeWheelOdometry {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::ThreeWheelOdometry
    }

    /// `[x, y, heading]`
    fn sample(&mut self) -> Result<Sample, DeviceError> {
        let pose = self.position();
        Ok(vec![pose.x, pose.y, pose.heading])
    }

    fn command(&mut self, _value: f64) -> Result<(), DeviceError> {
        Ok(())
    }

    fn teardown(&mut self) {
        self.tracker.stop();
        debug!("Odometry '{}' pose tracker stopped", self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn odometry() -> ThreeWheelOdometry {
        ThreeWheelOdometry::new(&DeviceConfig::new("odo", DeviceKind::ThreeWheelOdometry))
            .expect("spawn tracker")
    }

    #[test]
    fn test_advance_straight_and_rotated() {
        let twist = Twist {
            forward: 10.0,
            strafe: 0.0,
            turn: 0.0,
        };
        let moved = advance(Pose::default(), twist, 0.5);
        assert!((moved.x - 5.0).abs() < 1e-12);
        assert!(moved.y.abs() < 1e-12);

        let facing_left = Pose {
            heading: FRAC_PI_2,
            ..Pose::default()
        };
        let moved = advance(facing_left, twist, 1.0);
        assert!(moved.x.abs() < 1e-9);
        assert!((moved.y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_tracker_integrates_twist() {
        let odo = odometry();
        odo.handle().set_twist(Twist {
            forward: 100.0,
            strafe: 0.0,
            turn: 0.0,
        });
        thread::sleep(Duration::from_millis(60));
        assert!(odo.position().x > 0.0);
    }

    #[test]
    fn test_set_position_reflected_in_sample() {
        let mut odo = odometry();
        odo.set_position(Pose {
            x: 1.0,
            y: 2.0,
            heading: 0.5,
        });
        let sample = odo.sample().unwrap();
        assert_eq!(sample.len(), 3);
        assert_eq!(sample[1], 2.0);
        assert_eq!(sample[2], 0.5);
    }

    #[test]
    fn test_teardown_stops_tracker() {
        let mut odo = odometry();
        assert!(odo.is_tracking());
        odo.teardown();
        assert!(!odo.is_tracking());

        let handle = odo.handle();
        handle.set_twist(Twist {
            forward: 100.0,
            strafe: 0.0,
            turn: 0.0,
        });
        let before = handle.pose();
        thread::sleep(Duration::from_millis(30));
        assert_eq!(handle.pose(), before);

        odo.teardown();
    }
}
