//! Rover Common Library
//!
//! This crate provides the device capability contract, shared constants and
//! configuration loading utilities for all rover workspace crates.
//!
//! # Module Structure
//!
//! - [`consts`] - System-wide limits and timing defaults
//! - [`config`] - Configuration loading traits and types
//! - [`hal`] - Device contract, slot types and roster configuration
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use rover_common::prelude::*;
//!
//! assert!(DeviceKind::Motor.requires_closed_loop_reset());
//! ```

pub mod config;
pub mod consts;
pub mod hal;
pub mod prelude;
