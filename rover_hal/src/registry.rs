//! Device registry: builds a roster from `roster.toml`.
//!
//! Maps each `DeviceKind` to a factory. The registry is constructed at
//! startup, populated via `register()` and used once to build the roster.
//! No global state, so tests can register their own factories.

use crate::devices::{
    BulkHub, DistanceProbe, OdometryHandle, SimDistanceSensor, SimMotor, SimServo,
    ThreeWheelOdometry,
};
use crate::roster::{BulkCache, DeviceRoster};
use rover_common::hal::config::{DeviceConfig, RosterConfig};
use rover_common::hal::element::{HalError, HardwareElement};
use rover_common::hal::types::DeviceKind;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Name of the simulated hub every device is attached to.
pub const SIM_HUB_NAME: &str = "control_hub";

/// Shared state handed to every factory while a roster is built.
pub struct BuildContext {
    /// Bulk cache of the hub the devices hang off.
    pub hub: Arc<BulkHub>,
    /// Simulation handles collected from the built devices.
    pub handles: SimHandles,
}

/// Handles for driving simulated devices after the roster is frozen.
#[derive(Debug, Clone, Default)]
pub struct SimHandles {
    /// Distance probes by device name.
    pub distance: HashMap<String, DistanceProbe>,
    /// Odometry handles by device name.
    pub odometry: HashMap<String, OdometryHandle>,
}

/// Factory function type for creating device instances.
pub type DeviceFactory =
    fn(&DeviceConfig, &mut BuildContext) -> Result<Box<dyn HardwareElement>, HalError>;

/// Registry of device factories.
pub struct DeviceRegistry {
    factories: HashMap<DeviceKind, DeviceFactory>,
}

impl DeviceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with every built-in simulated device.
    pub fn with_simulation_devices() -> Self {
        let mut registry = Self::new();
        registry.register(DeviceKind::Motor, create_motor);
        registry.register(DeviceKind::Servo, create_servo);
        registry.register(DeviceKind::DistanceSensor, create_distance_sensor);
        registry.register(DeviceKind::ThreeWheelOdometry, create_odometry);
        registry
    }

    /// Register a device factory.
    ///
    /// # Panics
    /// Panics if a factory for the same kind is already registered.
    pub fn register(&mut self, kind: DeviceKind, factory: DeviceFactory) {
        if self.factories.contains_key(&kind) {
            panic!("Device kind '{kind}' is already registered");
        }
        self.factories.insert(kind, factory);
    }

    /// Get a factory by kind.
    pub fn get_factory(&self, kind: DeviceKind) -> Option<DeviceFactory> {
        self.factories.get(&kind).copied()
    }

    /// List registered kinds.
    pub fn list_kinds(&self) -> Vec<DeviceKind> {
        self.factories.keys().copied().collect()
    }

    /// Build every configured device, in order, on one simulated hub.
    ///
    /// # Errors
    /// `HalError::ConfigError` if the config fails validation,
    /// `HalError::DeviceNotFound` for an unregistered kind, or whatever a
    /// factory returns.
    pub fn build_roster(&self, config: &RosterConfig) -> Result<(DeviceRoster, SimHandles), HalError> {
        config.validate()?;

        let hub = Arc::new(BulkHub::new(SIM_HUB_NAME));
        let mut ctx = BuildContext {
            hub: Arc::clone(&hub),
            handles: SimHandles::default(),
        };

        let mut builder = DeviceRoster::builder().bulk_cache(hub as Arc<dyn BulkCache>);
        for (idx, device) in config.devices.iter().enumerate() {
            let factory = self
                .get_factory(device.kind)
                .ok_or(HalError::DeviceNotFound(device.kind))?;
            let element = factory(device, &mut ctx)?;
            info!(
                "  Slot {}: {} ({}, {:?})",
                idx,
                element.name(),
                element.kind(),
                element.classification()
            );
            builder = builder.device(element);
        }

        let roster = builder.build();
        info!("Built roster with {} devices", roster.len());
        Ok((roster, ctx.handles))
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn create_motor(
    config: &DeviceConfig,
    ctx: &mut BuildContext,
) -> Result<Box<dyn HardwareElement>, HalError> {
    Ok(Box::new(SimMotor::new(config, Arc::clone(&ctx.hub))))
}

fn create_servo(
    config: &DeviceConfig,
    _ctx: &mut BuildContext,
) -> Result<Box<dyn HardwareElement>, HalError> {
    Ok(Box::new(SimServo::new(config)))
}

fn create_distance_sensor(
    config: &DeviceConfig,
    ctx: &mut BuildContext,
) -> Result<Box<dyn HardwareElement>, HalError> {
    let sensor = SimDistanceSensor::new(config);
    ctx.handles
        .distance
        .insert(config.name.clone(), sensor.probe());
    Ok(Box::new(sensor))
}

fn create_odometry(
    config: &DeviceConfig,
    ctx: &mut BuildContext,
) -> Result<Box<dyn HardwareElement>, HalError> {
    let odometry = ThreeWheelOdometry::new(config)?;
    ctx.handles
        .odometry
        .insert(config.name.clone(), odometry.handle());
    Ok(Box::new(odometry))
}
