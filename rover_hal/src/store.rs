//! Shared value store between the sync thread and control logic.
//!
//! Four index-aligned fields, each behind its own lock:
//!
//! | Field        | Written by           | Read by              |
//! |--------------|----------------------|----------------------|
//! | timestamp    | sync thread          | control logic        |
//! | change flags | control logic        | sync thread          |
//! | commands     | control logic        | sync thread          |
//! | samples      | sync thread          | control logic        |
//!
//! Every access copies or replaces a whole field, so no caller ever sees a
//! partially updated array. The fields are not updated atomically with
//! respect to each other.

use parking_lot::Mutex;
use rover_common::hal::types::Sample;
use std::fmt;
use thiserror::Error;

/// Array fields of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreField {
    /// Per-slot change flags.
    ChangeFlags,
    /// Per-slot commanded values.
    Commands,
    /// Per-slot sampled values.
    Samples,
}

impl fmt::Display for StoreField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreField::ChangeFlags => "change_flags",
            StoreField::Commands => "commands",
            StoreField::Samples => "samples",
        })
    }
}

/// Errors returned by store writes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Array length differs from the roster size.
    #[error("{field}: expected {expected} slots, got {actual}")]
    SizeMismatch {
        /// Field written
        field: StoreField,
        /// Roster size
        expected: usize,
        /// Length supplied
        actual: usize,
    },
}

/// Concurrency-guarded register shared by the sync thread and control logic.
///
/// Share it as `Arc<SharedValueStore>`.
#[derive(Debug)]
pub struct SharedValueStore {
    slots: usize,
    timestamp: Mutex<f64>,
    change_flags: Mutex<Vec<bool>>,
    commands: Mutex<Vec<f64>>,
    samples: Mutex<Vec<Sample>>,
}

impl SharedValueStore {
    /// Create a store for `slots` devices.
    ///
    /// Timestamp 0.0, no flags set, all commands 0.0, every sample `[0.0]`.
    pub fn new(slots: usize) -> Self {
        Self {
            slots,
            timestamp: Mutex::new(0.0),
            change_flags: Mutex::new(vec![false; slots]),
            commands: Mutex::new(vec![0.0; slots]),
            samples: Mutex::new(vec![vec![0.0]; slots]),
        }
    }

    /// Number of slots (roster length).
    pub fn len(&self) -> usize {
        self.slots
    }

    /// True for a store sized for an empty roster.
    pub fn is_empty(&self) -> bool {
        self.slots == 0
    }

    /// Clock reading of the last completed sample pass [ms].
    pub fn timestamp(&self) -> f64 {
        *self.timestamp.lock()
    }

    /// Publish a new timestamp [ms].
    pub fn set_timestamp(&self, millis: f64) {
        *self.timestamp.lock() = millis;
    }

    /// Copy of the change flags.
    pub fn change_flags(&self) -> Vec<bool> {
        self.change_flags.lock().clone()
    }

    /// Replace the change flags.
    pub fn set_change_flags(&self, flags: Vec<bool>) -> Result<(), StoreError> {
        self.check_len(StoreField::ChangeFlags, flags.len())?;
        *self.change_flags.lock() = flags;
        Ok(())
    }

    /// Copy of the commanded values.
    pub fn commands(&self) -> Vec<f64> {
        self.commands.lock().clone()
    }

    /// Replace the commanded values.
    pub fn set_commands(&self, commands: Vec<f64>) -> Result<(), StoreError> {
        self.check_len(StoreField::Commands, commands.len())?;
        *self.commands.lock() = commands;
        Ok(())
    }

    /// Copy of the last published samples.
    pub fn samples(&self) -> Vec<Sample> {
        self.samples.lock().clone()
    }

    /// Replace the published samples.
    pub fn set_samples(&self, samples: Vec<Sample>) -> Result<(), StoreError> {
        self.check_len(StoreField::Samples, samples.len())?;
        *self.samples.lock() = samples;
        Ok(())
    }

    fn check_len(&self, field: StoreField, actual: usize) -> Result<(), StoreError> {
        if actual != self.slots {
            return Err(StoreError::SizeMismatch {
                field,
                expected: self.slots,
                actual,
            });
        }
        Ok(())
    }
}
