//! Roster file to running sync thread, end to end on simulated devices.

mod common;

use common::wait_until;
use rover_common::hal::config::RosterConfig;
use rover_hal::devices::Twist;
use rover_hal::{DeviceRegistry, HardwareSync, MonotonicClock, SharedValueStore};
use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_secs(2);

const ROSTER: &str = r#"
[shared]
service_name = "rover-hal-test"

[sync]
cadence_ms = 2
grace_delay_us = 0

[[devices]]
name = "left_front"
kind = "motor"

[[devices]]
name = "front_distance"
kind = "distance_sensor"
initial_mm = 300.0

[[devices]]
name = "odometry"
kind = "three_wheel_odometry"

[[devices]]
name = "claw"
kind = "servo"
initial_position = 0.5
"#;

fn load_roster() -> RosterConfig {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("roster.toml");
    fs::write(&path, ROSTER).unwrap();
    RosterConfig::from_file(&path).unwrap()
}

#[test]
fn test_simulated_roster_round_trip_through_store() {
    let config = load_roster();
    let (roster, handles) = DeviceRegistry::with_simulation_devices()
        .build_roster(&config)
        .unwrap();
    assert_eq!(
        roster.names(),
        vec!["left_front", "front_distance", "odometry", "claw"]
    );

    let store = Arc::new(SharedValueStore::new(roster.len()));
    let handle = HardwareSync::new(roster, Arc::clone(&store), config.sync.clone())
        .unwrap()
        .spawn()
        .unwrap();

    store.set_commands(vec![0.5, 0.0, 0.0, 0.25]).unwrap();
    store.set_change_flags(vec![true; 4]).unwrap();
    handle.start(Arc::new(MonotonicClock::new())).unwrap();

    // Motor integrates power into encoder ticks
    assert!(wait_until(TIMEOUT, || store.samples()[0][0] > 0.0));
    assert_eq!(store.samples()[1], vec![300.0]);
    assert!(wait_until(TIMEOUT, || store.samples()[3] == vec![0.25]));

    handles.distance["front_distance"].set_distance_mm(120.0);
    assert!(wait_until(TIMEOUT, || store.samples()[1] == vec![120.0]));

    handles.distance["front_distance"].set_connected(false);
    assert!(wait_until(TIMEOUT, || handle.stats().sample_failures > 0));
    assert_eq!(store.samples()[1], vec![120.0]);

    handles.odometry["odometry"].set_twist(Twist {
        forward: 50.0,
        strafe: 0.0,
        turn: 0.0,
    });
    assert!(wait_until(TIMEOUT, || store.samples()[2][0] > 0.0));

    handle.request_stop();
    let stats = handle.join().unwrap();
    assert!(stats.cycle_count > 0);
    assert_eq!(stats.command_failures, 0);

    // Pose tracker released by teardown
    let odometry = &handles.odometry["odometry"];
    let frozen = odometry.pose();
    thread::sleep(Duration::from_millis(30));
    assert_eq!(odometry.pose(), frozen);
}

#[test]
fn test_store_sized_for_other_roster_rejected() {
    let config = load_roster();
    let (roster, _) = DeviceRegistry::with_simulation_devices()
        .build_roster(&config)
        .unwrap();
    let store = Arc::new(SharedValueStore::new(2));
    assert!(HardwareSync::new(roster, store, config.sync.clone()).is_err());
}
