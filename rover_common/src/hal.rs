//! Device abstraction shared between the sync core and device adapters.
//!
//! - [`types`] - Device kinds, classifications, slots and run modes
//! - [`element`] - The `HardwareElement` capability contract and error types
//! - [`config`] - Roster and sync configuration loaded from TOML

pub mod config;
pub mod element;
pub mod types;
