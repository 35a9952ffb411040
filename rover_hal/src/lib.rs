//! # Rover HAL Library
//!
//! Fixed-cadence hardware sync thread for the rover controller.
//!
//! Control logic never touches devices directly. It writes commands and
//! change flags into a [`SharedValueStore`]; the sync thread samples and
//! commands the devices of a [`DeviceRoster`] at a fixed cadence and
//! publishes fresh samples and a timestamp back into the store.
//!
//! # Module Structure
//!
//! - [`core`] - Sync thread lifecycle and cycle body
//! - [`store`] - Shared value store
//! - [`roster`] - Ordered device roster and bulk caches
//! - [`registry`] - Device factory registration, roster construction
//! - [`devices`] - Simulated device implementations
//! - [`clock`] - Monotonic clock source
//! - [`stats`] - Cycle timing and failure counters
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                    rover_hal (single crate)                      │
//! │  ┌──────────────┐    ┌──────────────┐    ┌────────────────────┐  │
//! │  │ Control loop │◄──►│ SharedValue  │◄──►│  HardwareSync      │  │
//! │  │ (caller)     │    │ Store        │    │  (sync thread)     │  │
//! │  └──────────────┘    └──────────────┘    └─────────┬──────────┘  │
//! │                                                    │             │
//! │                                                    ▼             │
//! │                                          ┌──────────────────┐    │
//! │                                          │  DeviceRoster    │    │
//! │                                          │  HardwareElement │    │
//! │                                          └──────────────────┘    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod clock;
pub mod core;
pub mod devices;
pub mod registry;
pub mod roster;
pub mod stats;
pub mod store;

// Re-export key types for convenience
pub use crate::clock::{Clock, MonotonicClock};
pub use crate::core::{HardwareSync, SyncHandle, SyncState, SyncStopper};
pub use crate::registry::{DeviceRegistry, SimHandles};
pub use crate::roster::{BulkCache, DeviceRoster};
pub use crate::stats::{SyncHealth, SyncStats};
pub use crate::store::{SharedValueStore, StoreError, StoreField};
