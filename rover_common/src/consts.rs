//! System-wide constants for the rover workspace.
//!
//! Single source of truth for roster limits and sync timing defaults.

/// Canonical HAL service name (used for logging and thread naming).
pub const HAL_SERVICE_NAME: &str = "hal";

/// Maximum number of devices in one roster.
pub const MAX_DEVICES: usize = 64;

/// Default minimum interval between two sync cycles [ms].
pub const DEFAULT_CADENCE_MS: u64 = 5;

/// Default grace delay before the clock is attached [µs].
pub const DEFAULT_GRACE_DELAY_US: u64 = 2000;

/// Default number of cycles between two periodic statistics log lines.
pub const DEFAULT_STATS_LOG_INTERVAL: u64 = 1000;

/// Default roster configuration path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/rover/roster.toml";
