//! Simulated expansion hub bulk-read cache.
//!
//! A real hub answers one bulk transfer with every encoder and digital
//! input at once. Devices on the hub keep serving values from that transfer
//! until the cache is invalidated. The simulation models this with a
//! generation counter: a device refreshes its cached reading only when the
//! hub's generation moved since its last refresh.

use crate::roster::BulkCache;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::debug;

/// Shared bulk cache of one simulated hub.
#[derive(Debug)]
pub struct BulkHub {
    name: String,
    manual: AtomicBool,
    generation: AtomicU64,
}

impl BulkHub {
    /// Hub in automatic mode: every read is fresh.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            manual: AtomicBool::new(false),
            generation: AtomicU64::new(1),
        }
    }

    /// Hub name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether reads wait for an explicit `invalidate()`.
    pub fn is_manual(&self) -> bool {
        self.manual.load(Ordering::Acquire)
    }

    /// Generation a device read should be served from.
    ///
    /// Automatic mode advances the generation on every call.
    pub fn read_generation(&self) -> u64 {
        if self.is_manual() {
            self.generation.load(Ordering::Acquire)
        } else {
            self.generation.fetch_add(1, Ordering::AcqRel) + 1
        }
    }
}

impl BulkCache for BulkHub {
    fn set_manual(&self) {
        if !self.manual.swap(true, Ordering::AcqRel) {
            debug!("Hub '{}' switched to manual bulk caching", self.name);
        }
    }

    fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

/// A device reading tagged with the hub generation it was taken in.
#[derive(Debug, Clone)]
pub(crate) struct CachedRead<T> {
    generation: u64,
    value: T,
}

impl<T> CachedRead<T> {
    /// Cache that refreshes on the first read.
    pub(crate) fn new(value: T) -> Self {
        Self {
            generation: 0,
            value,
        }
    }

    /// Whether the hub moved to a newer generation than the cached value.
    pub(crate) fn is_stale(&self, generation: u64) -> bool {
        generation != self.generation
    }

    /// Replace the cached value.
    pub(crate) fn store(&mut self, generation: u64, value: T) {
        self.generation = generation;
        self.value = value;
    }

    /// Cached value.
    pub(crate) fn value(&self) -> &T {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_mode_always_refreshes() {
        let hub = BulkHub::new("control_hub");
        let mut cache = CachedRead::new(0);

        for expected in 1..=3 {
            let generation = hub.read_generation();
            assert!(cache.is_stale(generation));
            cache.store(generation, expected);
        }
        assert_eq!(*cache.value(), 3);
    }

    #[test]
    fn test_manual_mode_serves_stale_until_invalidated() {
        let hub = BulkHub::new("control_hub");
        hub.set_manual();
        assert!(hub.is_manual());

        let mut cache = CachedRead::new(0);
        let generation = hub.read_generation();
        assert!(cache.is_stale(generation));
        cache.store(generation, 10);
        assert!(!cache.is_stale(hub.read_generation()));

        hub.invalidate();
        assert!(cache.is_stale(hub.read_generation()));
    }
}
