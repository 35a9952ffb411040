//! Clock sources attached to the sync thread at start.

use std::time::Instant;

/// Monotonic millisecond clock.
pub trait Clock: Send + Sync {
    /// Milliseconds elapsed since the clock's origin.
    fn elapsed_ms(&self) -> f64;
}

/// `Instant`-based clock, origin at construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Clock starting at zero now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Move the origin to now.
    pub fn reset(&mut self) {
        self.origin = Instant::now();
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn elapsed_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_monotonic_and_resettable() {
        let mut clock = MonotonicClock::new();
        let first = clock.elapsed_ms();
        thread::sleep(Duration::from_millis(3));
        let second = clock.elapsed_ms();
        assert!(second >= first + 2.0, "{first} -> {second}");

        clock.reset();
        assert!(clock.elapsed_ms() < second);
    }
}
