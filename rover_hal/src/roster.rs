//! Device roster: the ordered, fixed set of devices driven by the sync thread.
//!
//! The roster is built once at startup (usually by
//! [`DeviceRegistry::build_roster`](crate::registry::DeviceRegistry::build_roster))
//! and never grows or shrinks afterwards. Slot `i` of every shared store
//! array refers to `devices[i]`.

use rover_common::hal::element::HardwareElement;
use rover_common::hal::types::DeviceSlot;
use std::fmt;
use std::sync::Arc;

/// A batched device-read cache (one per expansion hub).
///
/// In manual mode reads are served from the last bulk transfer until
/// `invalidate()` is called.
pub trait BulkCache: Send + Sync {
    /// Stop refreshing on every read; refresh only after `invalidate()`.
    fn set_manual(&self);

    /// Force the next read to fetch fresh device state.
    fn invalidate(&self);
}

/// Ordered, fixed-size collection of devices.
pub struct DeviceRoster {
    devices: Vec<Box<dyn HardwareElement>>,
    caches: Vec<Arc<dyn BulkCache>>,
}

impl DeviceRoster {
    /// Start building a roster.
    pub fn builder() -> DeviceRosterBuilder {
        DeviceRosterBuilder::default()
    }

    /// Number of devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// True when no device was added.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Slot descriptors in roster order.
    pub fn slots(&self) -> Vec<DeviceSlot> {
        self.devices
            .iter()
            .enumerate()
            .map(|(index, device)| DeviceSlot {
                index,
                kind: device.kind(),
                classification: device.classification(),
            })
            .collect()
    }

    /// Device names in roster order.
    pub fn names(&self) -> Vec<&str> {
        self.devices.iter().map(|d| d.name()).collect()
    }

    /// Device at `index`.
    pub fn device(&self, index: usize) -> Option<&dyn HardwareElement> {
        self.devices.get(index).map(|d| d.as_ref())
    }

    /// Switch every bulk cache to manual refresh.
    pub fn enable_manual_bulk_caching(&self) {
        for cache in &self.caches {
            cache.set_manual();
        }
    }

    /// Invalidate every bulk cache.
    pub fn clear_bulk_cache(&self) {
        for cache in &self.caches {
            cache.invalidate();
        }
    }

    /// Mutable access to the devices. The slice cannot change length.
    pub(crate) fn devices_mut(&mut self) -> &mut [Box<dyn HardwareElement>] {
        &mut self.devices
    }
}

impl fmt::Debug for DeviceRoster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceRoster")
            .field("devices", &self.names())
            .field("caches", &self.caches.len())
            .finish()
    }
}

/// Collects devices and bulk caches before the roster is frozen.
#[derive(Default)]
pub struct DeviceRosterBuilder {
    devices: Vec<Box<dyn HardwareElement>>,
    caches: Vec<Arc<dyn BulkCache>>,
}

impl DeviceRosterBuilder {
    /// Append a device; it takes the next slot index.
    pub fn device(mut self, device: Box<dyn HardwareElement>) -> Self {
        self.devices.push(device);
        self
    }

    /// Register a bulk cache invalidated at the start of every cycle.
    pub fn bulk_cache(mut self, cache: Arc<dyn BulkCache>) -> Self {
        self.caches.push(cache);
        self
    }

    /// Freeze the roster.
    pub fn build(self) -> DeviceRoster {
        DeviceRoster {
            devices: self.devices,
            caches: self.caches,
        }
    }
}
