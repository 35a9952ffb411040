//! Hardware sync thread: fixed-cadence device I/O decoupled from control logic.
//!
//! ## Lifecycle
//!
//! ```text
//! AwaitingStart ──start(clock)──► Running ──request_stop()──► Stopping ──► Terminated
//!       │                                                        ▲
//!       └────────────────────request_stop()──────────────────────┘
//! ```
//!
//! The thread performs no device I/O until a clock is attached. Once
//! running it executes one cycle whenever at least one cadence period has
//! elapsed on that clock. A stop request is observed before every cycle, so
//! a cycle that has started always completes. Teardown runs exactly once on
//! the way to `Terminated`.
//!
//! ## Cycle Body
//!
//! 1. Invalidate the bulk caches
//! 2. Read change flags
//! 3. Sample every flagged device into the local sample buffer
//! 4. Publish the sample buffer and the cycle timestamp
//! 5. Read commands and change flags again
//! 6. Command every flagged device not classified as a sensor
//!
//! One change flag drives both the sample pass and the command pass, so a
//! flag raised to request a fresh sample also re-applies the slot's current
//! command to an actuator.

use crate::clock::Clock;
use crate::roster::DeviceRoster;
use crate::stats::SyncStats;
use crate::store::{SharedValueStore, StoreError};
use parking_lot::{Condvar, Mutex, MutexGuard};
use rover_common::consts::HAL_SERVICE_NAME;
use rover_common::hal::config::{CadenceMode, SyncConfig};
use rover_common::hal::element::HalError;
use rover_common::hal::types::{Classification, DeviceSlot, RunMode, Sample};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

impl From<StoreError> for HalError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SizeMismatch {
                expected, actual, ..
            } => HalError::SizeMismatch { expected, actual },
        }
    }
}

/// Sync thread lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SyncState {
    /// Thread exists, no clock attached, no device I/O.
    AwaitingStart = 0,
    /// Executing cycles.
    Running = 1,
    /// Stop requested; finishing the current cycle or tearing down.
    Stopping = 2,
    /// Teardown complete; thread exited or exiting.
    Terminated = 3,
}

impl SyncState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => SyncState::AwaitingStart,
            1 => SyncState::Running,
            2 => SyncState::Stopping,
            _ => SyncState::Terminated,
        }
    }
}

/// State shared between the sync thread and its handles.
struct Control {
    stop: AtomicBool,
    state: AtomicU8,
    /// Attached clock; also the mutex the wake condvar waits on.
    gate: Mutex<Option<Arc<dyn Clock>>>,
    wake: Condvar,
    stats: Mutex<SyncStats>,
}

impl Control {
    fn new() -> Self {
        Self {
            stop: AtomicBool::new(false),
            state: AtomicU8::new(SyncState::AwaitingStart as u8),
            gate: Mutex::new(None),
            wake: Condvar::new(),
            stats: Mutex::new(SyncStats::default()),
        }
    }

    fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    fn state(&self) -> SyncState {
        SyncState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: SyncState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn transition(&self, from: SyncState, to: SyncState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn request_stop(&self) {
        if self.stop.swap(true, Ordering::AcqRel) {
            return;
        }
        if !self.transition(SyncState::Running, SyncState::Stopping) {
            self.transition(SyncState::AwaitingStart, SyncState::Stopping);
        }
        // Notify under the gate so a waiter cannot miss the flag.
        let _gate = self.gate.lock();
        self.wake.notify_all();
    }
}

/// Sync core before its thread is spawned.
pub struct HardwareSync {
    worker: SyncWorker,
    config: SyncConfig,
}

impl HardwareSync {
    /// Bind a roster to a store.
    ///
    /// Publishes the initial store state (timestamp 0, no flags, zero
    /// commands, `[0.0]` samples) and switches the roster's bulk caches to
    /// manual refresh.
    ///
    /// # Errors
    /// `HalError::SizeMismatch` if the store was sized for a different
    /// roster, `HalError::ConfigError` for invalid timing.
    pub fn new(
        roster: DeviceRoster,
        store: Arc<SharedValueStore>,
        config: SyncConfig,
    ) -> Result<Self, HalError> {
        config.validate()?;
        if store.len() != roster.len() {
            return Err(HalError::SizeMismatch {
                expected: roster.len(),
                actual: store.len(),
            });
        }

        let slots = roster.len();
        store.set_timestamp(0.0);
        store.set_change_flags(vec![false; slots])?;
        store.set_commands(vec![0.0; slots])?;
        store.set_samples(vec![vec![0.0]; slots])?;
        roster.enable_manual_bulk_caching();

        info!(
            "HardwareSync created with {} devices, cadence={}ms ({:?})",
            slots, config.cadence_ms, config.cadence_mode
        );

        Ok(Self {
            worker: SyncWorker::new(roster, store, config.stats_log_interval),
            config,
        })
    }

    /// Spawn the sync thread in `AwaitingStart`.
    pub fn spawn(self) -> Result<SyncHandle, HalError> {
        let control = Arc::new(Control::new());
        let grace_delay = self.config.grace_delay();
        let thread_control = Arc::clone(&control);
        let HardwareSync { worker, config } = self;

        let thread = thread::Builder::new()
            .name(format!("{HAL_SERVICE_NAME}-sync"))
            .spawn(move || run_sync_thread(worker, &thread_control, &config))
            .map_err(|e| HalError::InitFailed(format!("Failed to spawn sync thread: {e}")))?;

        Ok(SyncHandle {
            control,
            grace_delay,
            thread: Some(thread),
        })
    }
}

/// Cloneable stop trigger, e.g. for a signal handler.
#[derive(Clone)]
pub struct SyncStopper {
    control: Arc<Control>,
}

impl SyncStopper {
    /// Request termination; see [`SyncHandle::request_stop`].
    pub fn request_stop(&self) {
        self.control.request_stop();
    }
}

/// Owner of a running sync thread.
///
/// Dropping the handle requests a stop and joins the thread.
pub struct SyncHandle {
    control: Arc<Control>,
    grace_delay: Duration,
    thread: Option<JoinHandle<SyncStats>>,
}

impl SyncHandle {
    /// Attach the clock and let the thread run.
    ///
    /// Waits the configured grace delay on the calling thread first. A stop
    /// request during the delay interrupts it; the interruption is logged
    /// and startup proceeds (the thread then goes straight to teardown).
    ///
    /// On return the state is `Running` unless a stop was requested.
    ///
    /// # Errors
    /// `HalError::InitFailed` if a clock is already attached.
    pub fn start(&self, clock: Arc<dyn Clock>) -> Result<(), HalError> {
        let deadline = Instant::now() + self.grace_delay;
        let mut gate = self.control.gate.lock();
        if gate.is_some() {
            return Err(HalError::InitFailed(
                "sync thread already started".to_string(),
            ));
        }

        match wait_grace_delay(&self.control, &mut gate, deadline) {
            GraceDelay::Elapsed => {}
            GraceDelay::Interrupted => warn!("Startup grace delay interrupted by stop request"),
            GraceDelay::StoppedBeforeStart => debug!("Stop already requested, skipping grace delay"),
        }

        *gate = Some(clock);
        // Running is visible to the caller as soon as start returns.
        if self.control.transition(SyncState::AwaitingStart, SyncState::Running) {
            info!("Clock attached to sync thread");
        }
        self.control.wake.notify_all();
        Ok(())
    }

    /// Request termination.
    ///
    /// Observed before the next cycle; a cycle in progress completes.
    /// Teardown has no timeout; bound it with your own join deadline.
    pub fn request_stop(&self) {
        info!("Sync thread stop requested");
        self.control.request_stop();
    }

    /// Stop trigger that can outlive a borrow of the handle.
    pub fn stopper(&self) -> SyncStopper {
        SyncStopper {
            control: Arc::clone(&self.control),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SyncState {
        self.control.state()
    }

    /// Snapshot of the timing and failure counters.
    pub fn stats(&self) -> SyncStats {
        *self.control.stats.lock()
    }

    /// Whether the thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(|t| t.is_finished())
    }

    /// Wait for the thread to exit and return its final statistics.
    ///
    /// Does not request a stop by itself.
    ///
    /// # Errors
    /// `HalError::ThreadPanicked` if a device panicked inside the thread.
    pub fn join(mut self) -> Result<SyncStats, HalError> {
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|panic| {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                HalError::ThreadPanicked(message)
            }),
            None => Ok(self.stats()),
        }
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.control.request_stop();
            if thread.join().is_err() {
                error!("Sync thread panicked during shutdown");
            }
        }
    }
}

/// Device-side state owned by the sync thread.
struct SyncWorker {
    roster: DeviceRoster,
    store: Arc<SharedValueStore>,
    slots: Vec<DeviceSlot>,
    /// Last sample per slot; unflagged slots keep their previous value.
    samples: Vec<Sample>,
    stats: SyncStats,
    stats_log_interval: u64,
}

impl SyncWorker {
    fn new(roster: DeviceRoster, store: Arc<SharedValueStore>, stats_log_interval: u64) -> Self {
        let slots = roster.slots();
        let samples = vec![vec![0.0]; slots.len()];
        Self {
            roster,
            store,
            slots,
            samples,
            stats: SyncStats::default(),
            stats_log_interval,
        }
    }

    /// Execute one full cycle stamped with `now_ms`.
    fn cycle(&mut self, now_ms: f64) {
        self.roster.clear_bulk_cache();

        let flags = self.store.change_flags();
        for ((device, flagged), sample) in self
            .roster
            .devices_mut()
            .iter_mut()
            .zip(&flags)
            .zip(self.samples.iter_mut())
        {
            if !*flagged {
                continue;
            }
            match device.sample() {
                Ok(value) => *sample = value,
                Err(e) => {
                    self.stats.sample_failures += 1;
                    if should_log(self.stats.sample_failures) {
                        warn!(
                            "Sample failure #{} on '{}': {}",
                            self.stats.sample_failures,
                            device.name(),
                            e
                        );
                    }
                }
            }
        }

        if let Err(e) = self.store.set_samples(self.samples.clone()) {
            error!("Failed to publish samples: {}", e);
        }
        self.store.set_timestamp(now_ms);

        let commands = self.store.commands();
        let flags = self.store.change_flags();
        for (((device, slot), flagged), value) in self
            .roster
            .devices_mut()
            .iter_mut()
            .zip(&self.slots)
            .zip(&flags)
            .zip(&commands)
        {
            if !*flagged || slot.classification == Classification::Sensor {
                continue;
            }
            if let Err(e) = device.command(*value) {
                self.stats.command_failures += 1;
                if should_log(self.stats.command_failures) {
                    warn!(
                        "Command failure #{} on '{}': {}",
                        self.stats.command_failures,
                        device.name(),
                        e
                    );
                }
            }
        }
    }

    /// Release device resources and reset closed-loop actuators.
    fn teardown(&mut self) {
        for (device, slot) in self.roster.devices_mut().iter_mut().zip(&self.slots) {
            device.teardown();

            if slot.kind.requires_closed_loop_reset()
                && slot.classification == Classification::Actuator
            {
                for mode in [RunMode::StopAndResetEncoder, RunMode::RunUsingEncoder] {
                    if let Err(e) = device.set_run_mode(mode) {
                        warn!("Reset of '{}' to {:?} failed: {}", device.name(), mode, e);
                    }
                }
            }
        }
        info!("Teardown complete for {} devices", self.slots.len());
    }

    fn record_cycle(&mut self, elapsed: Duration, cadence_us: u64) {
        let cycle_us = elapsed.as_micros() as u64;
        let overruns_before = self.stats.overruns;
        self.stats.record_cycle(cycle_us, cadence_us);

        if self.stats.overruns > overruns_before && should_log(self.stats.overruns) {
            warn!(
                "Cadence overrun #{}: cycle took {}us (cadence {}us)",
                self.stats.overruns, cycle_us, cadence_us
            );
        }

        if self.stats.cycle_count % self.stats_log_interval == 0 {
            debug!(
                "Sync loop: {} cycles, avg={}us, max={}us, overruns={}, health={}",
                self.stats.cycle_count,
                self.stats.avg_cycle_us(),
                self.stats.max_cycle_us,
                self.stats.overruns,
                self.stats.health()
            );
        }
    }
}

/// First ten occurrences, then every thousandth.
fn should_log(count: u64) -> bool {
    count <= 10 || count % 1000 == 0
}

fn run_sync_thread(mut worker: SyncWorker, control: &Control, config: &SyncConfig) -> SyncStats {
    if detect_rt_mode() {
        info!("Sync thread running with real-time scheduling");
    } else {
        debug!("Sync thread running with standard scheduling");
    }

    if let Some(clock) = wait_for_clock(control) {
        info!("Sync loop started (cadence={}ms)", config.cadence_ms);
        run_cycles(&mut worker, control, config, clock.as_ref());
    } else {
        info!("Stop requested before a clock was attached");
    }

    control.set_state(SyncState::Stopping);
    worker.teardown();
    *control.stats.lock() = worker.stats;
    control.set_state(SyncState::Terminated);

    info!(
        "Sync thread terminated after {} cycles (overruns: {}, sample failures: {}, command failures: {})",
        worker.stats.cycle_count,
        worker.stats.overruns,
        worker.stats.sample_failures,
        worker.stats.command_failures
    );
    worker.stats
}

/// How the startup grace delay ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GraceDelay {
    /// Full delay waited.
    Elapsed,
    /// A stop request arrived during the delay.
    Interrupted,
    /// Stop was already requested; no wait.
    StoppedBeforeStart,
}

/// Wait on the gate until `deadline` or a stop request.
fn wait_grace_delay(
    control: &Control,
    gate: &mut MutexGuard<'_, Option<Arc<dyn Clock>>>,
    deadline: Instant,
) -> GraceDelay {
    if control.stop_requested() {
        return GraceDelay::StoppedBeforeStart;
    }
    while !control.stop_requested() {
        if control.wake.wait_until(gate, deadline).timed_out() {
            break;
        }
    }
    if control.stop_requested() && Instant::now() < deadline {
        GraceDelay::Interrupted
    } else {
        GraceDelay::Elapsed
    }
}

/// Block in `AwaitingStart` until a clock is attached or stop is requested.
fn wait_for_clock(control: &Control) -> Option<Arc<dyn Clock>> {
    let mut gate = control.gate.lock();
    while gate.is_none() && !control.stop_requested() {
        control.wake.wait(&mut gate);
    }
    if control.stop_requested() {
        None
    } else {
        gate.clone()
    }
}

/// Run cycles until stop is requested.
///
/// The first cycle runs as soon as the clock is attached, whatever the clock
/// reads; later cycles wait until one cadence has elapsed since the previous
/// cycle's timestamp.
fn run_cycles(worker: &mut SyncWorker, control: &Control, config: &SyncConfig, clock: &dyn Clock) {
    let cadence_ms = config.cadence_ms as f64;
    let cadence_us = config.cadence_ms * 1000;
    let mut last_cycle_ms: Option<f64> = None;

    while !control.stop_requested() {
        let now_ms = clock.elapsed_ms();
        let since_last = last_cycle_ms.map(|last| now_ms - last);

        match since_last {
            Some(elapsed) if elapsed < cadence_ms => match config.cadence_mode {
                CadenceMode::Deadline => {
                    let remaining = Duration::from_secs_f64((cadence_ms - elapsed) / 1000.0);
                    let mut gate = control.gate.lock();
                    if !control.stop_requested() {
                        control.wake.wait_for(&mut gate, remaining);
                    }
                }
                CadenceMode::Spin => std::hint::spin_loop(),
            },
            _ => {
                last_cycle_ms = Some(now_ms);
                let started = Instant::now();
                worker.cycle(now_ms);
                worker.record_cycle(started.elapsed(), cadence_us);
                *control.stats.lock() = worker.stats;
            }
        }
    }
}

/// Detect if running in real-time mode by checking scheduler policy.
fn detect_rt_mode() -> bool {
    #[cfg(target_os = "linux")]
    {
        // SAFETY: sched_getscheduler(0) only queries the calling thread's policy.
        let policy = unsafe { libc::sched_getscheduler(0) };
        policy == libc::SCHED_FIFO || policy == libc::SCHED_RR
    }
    #[cfg(not(target_os = "linux"))]
    {
        false
    }
}
