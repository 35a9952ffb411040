//! # Rover HAL Binary
//!
//! Runs the hardware sync thread against a simulated roster and acts as a
//! minimal control loop: every report interval it flags all slots, holds
//! actuator commands at zero and logs what the devices reported.
//!
//! # Usage
//!
//! ```bash
//! # Run until Ctrl-C
//! rover_hal --config config/roster.toml
//!
//! # Run for two seconds with debug logging
//! rover_hal --config config/roster.toml --duration-ms 2000 -v
//!
//! # JSON logs
//! rover_hal --config config/roster.toml --json
//! ```

use clap::Parser;
use rover_common::config::LogLevel;
use rover_common::consts::DEFAULT_CONFIG_PATH;
use rover_common::hal::config::RosterConfig;
use rover_hal::{DeviceRegistry, HardwareSync, MonotonicClock, SharedValueStore, SyncState};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Interval between control loop reports.
const REPORT_INTERVAL: Duration = Duration::from_millis(100);

/// Rover HAL - fixed-cadence hardware sync thread
#[derive(Parser, Debug)]
#[command(name = "rover_hal")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Fixed-cadence hardware sync thread for the rover controller")]
#[command(long_about = None)]
struct Args {
    /// Path to roster configuration file (roster.toml)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Stop after this many milliseconds (default: run until Ctrl-C)
    #[arg(short, long, value_name = "MS")]
    duration_ms: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    if let Err(e) = run() {
        error!("Rover HAL failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = RosterConfig::from_file(&args.config);
    let log_level = config
        .as_ref()
        .map(|c| c.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, log_level);
    let config = config.map_err(|e| format!("{}: {}", args.config.display(), e))?;

    info!(
        "Rover HAL v{} starting ({})",
        env!("CARGO_PKG_VERSION"),
        config.shared.service_name
    );

    let registry = DeviceRegistry::with_simulation_devices();
    let (roster, _handles) = registry.build_roster(&config)?;
    let store = Arc::new(SharedValueStore::new(roster.len()));
    let names = roster
        .names()
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();

    let handle = HardwareSync::new(roster, Arc::clone(&store), config.sync.clone())?.spawn()?;

    let stopper = handle.stopper();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        stopper.request_stop();
    })?;

    handle.start(Arc::new(MonotonicClock::new()))?;

    let deadline = args.duration_ms.map(|ms| Instant::now() + Duration::from_millis(ms));
    while handle.state() == SyncState::Running {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            info!("Run duration elapsed");
            break;
        }

        store.set_commands(vec![0.0; names.len()])?;
        store.set_change_flags(vec![true; names.len()])?;
        thread::sleep(REPORT_INTERVAL);

        let timestamp = store.timestamp();
        for (name, sample) in names.iter().zip(store.samples()) {
            info!("[{:>10.1} ms] {}: {:?}", timestamp, name, sample);
        }
    }

    handle.request_stop();
    let stats = handle.join()?;
    info!(
        "Sync stats: {} cycles, avg={}us, max={}us, overruns={}, sample failures={}, command failures={}, health={}",
        stats.cycle_count,
        stats.avg_cycle_us(),
        stats.max_cycle_us,
        stats.overruns,
        stats.sample_failures,
        stats.command_failures,
        stats.health()
    );

    info!("Rover HAL shutdown complete");
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and configured level.
fn setup_tracing(args: &Args, log_level: LogLevel) {
    let directive = if args.verbose {
        LogLevel::Debug.as_directive()
    } else {
        log_level.as_directive()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
