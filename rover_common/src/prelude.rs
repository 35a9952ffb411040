//! Prelude module for common re-exports.
//!
//! ```rust
//! use rover_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
pub use crate::hal::config::{CadenceMode, DeviceConfig, RosterConfig, SyncConfig};

// ─── Device Contract ────────────────────────────────────────────────
pub use crate::hal::element::{DeviceError, HalError, HardwareElement};
pub use crate::hal::types::{Classification, DeviceKind, DeviceSlot, RunMode, Sample};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{DEFAULT_CADENCE_MS, MAX_DEVICES};
