//! Simulated device adapters.
//!
//! Software stand-ins for the devices on a rover, used for development and
//! testing without physical hardware:
//!
//! - [`bulk`] - Expansion hub bulk-read cache
//! - [`motor`] - DC motor with encoder and run modes
//! - [`servo`] - Positional servo
//! - [`distance`] - Distance sensor with a probe handle
//! - [`odometry`] - Three-wheel odometry with a background pose tracker
//!
//! # Adding New Devices
//!
//! 1. Create a new submodule under `devices/`
//! 2. Implement `HardwareElement` from `rover_common::hal::element`
//! 3. Add a `DeviceKind` variant and register a factory in
//!    `DeviceRegistry::with_simulation_devices()`

pub mod bulk;
pub mod distance;
pub mod motor;
pub mod odometry;
pub mod servo;

pub use bulk::BulkHub;
pub use distance::{DistanceProbe, SimDistanceSensor};
pub use motor::SimMotor;
pub use odometry::{OdometryHandle, Pose, ThreeWheelOdometry, Twist};
pub use servo::SimServo;
