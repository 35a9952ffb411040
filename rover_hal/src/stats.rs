//! Sync loop timing and failure statistics.

use std::fmt;

/// Health derived from the share of cycles that overran the cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncHealth {
    /// Overrun rate ≤ 0.1 %.
    Healthy,
    /// Overrun rate ≤ 1 %.
    Warning,
    /// Overrun rate ≤ 10 %.
    Degraded,
    /// Overrun rate above 10 %.
    Critical,
}

impl fmt::Display for SyncHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SyncHealth::Healthy => "healthy",
            SyncHealth::Warning => "warning",
            SyncHealth::Degraded => "degraded",
            SyncHealth::Critical => "critical",
        })
    }
}

/// Counters updated once per cycle. O(1), no allocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Number of cycles executed.
    pub cycle_count: u64,
    /// Cycles whose execution took longer than the cadence.
    pub overruns: u64,
    /// Longest cycle execution [µs].
    pub max_cycle_us: u64,
    /// Sum of cycle execution times [µs].
    pub total_cycle_us: u64,
    /// Device sample failures.
    pub sample_failures: u64,
    /// Device command failures.
    pub command_failures: u64,
}

impl SyncStats {
    /// Record one cycle's execution time.
    #[inline]
    pub fn record_cycle(&mut self, cycle_us: u64, cadence_us: u64) {
        self.cycle_count += 1;
        self.total_cycle_us += cycle_us;
        if cycle_us > self.max_cycle_us {
            self.max_cycle_us = cycle_us;
        }
        if cycle_us > cadence_us {
            self.overruns += 1;
        }
    }

    /// Average cycle execution time [µs] (0 if no cycles).
    pub fn avg_cycle_us(&self) -> u64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.total_cycle_us / self.cycle_count
        }
    }

    /// Health from the overrun rate.
    pub fn health(&self) -> SyncHealth {
        let overrun_rate = if self.cycle_count > 0 {
            self.overruns as f64 / self.cycle_count as f64
        } else {
            0.0
        };

        if overrun_rate > 0.1 {
            SyncHealth::Critical
        } else if overrun_rate > 0.01 {
            SyncHealth::Degraded
        } else if overrun_rate > 0.001 {
            SyncHealth::Warning
        } else {
            SyncHealth::Healthy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_cycle() {
        let mut stats = SyncStats::default();
        stats.record_cycle(100, 5000);
        stats.record_cycle(300, 5000);
        stats.record_cycle(6000, 5000);

        assert_eq!(stats.cycle_count, 3);
        assert_eq!(stats.overruns, 1);
        assert_eq!(stats.max_cycle_us, 6000);
        assert_eq!(stats.avg_cycle_us(), 2133);
    }

    #[test]
    fn test_health_from_overruns() {
        let mut stats = SyncStats {
            cycle_count: 1000,
            ..SyncStats::default()
        };
        assert_eq!(stats.health(), SyncHealth::Healthy);

        stats.overruns = 5;
        assert_eq!(stats.health(), SyncHealth::Warning);

        stats.overruns = 20;
        assert_eq!(stats.health(), SyncHealth::Degraded);

        stats.overruns = 150;
        assert_eq!(stats.health(), SyncHealth::Critical);
    }

    #[test]
    fn test_empty_stats() {
        let stats = SyncStats::default();
        assert_eq!(stats.avg_cycle_us(), 0);
        assert_eq!(stats.health(), SyncHealth::Healthy);
    }
}
