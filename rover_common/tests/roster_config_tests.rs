//! Roster file loading tests.
//!
//! Covers `RosterConfig::from_file`: defaults, kind parsing, slot ordering,
//! duplicate detection, unknown field rejection and device count limits.

use rover_common::config::{ConfigError, LogLevel};
use rover_common::consts::MAX_DEVICES;
use rover_common::hal::config::{CadenceMode, RosterConfig};
use rover_common::hal::types::DeviceKind;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_roster(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("roster.toml");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_full_roster_loads_in_slot_order() {
    let dir = TempDir::new().unwrap();
    let path = write_roster(
        &dir,
        r#"
[shared]
service_name = "rover-hal"
log_level = "debug"

[sync]
cadence_ms = 10
grace_delay_us = 500
cadence_mode = "spin"

[[devices]]
name = "front_distance"
kind = "distance_sensor"
initial_mm = 250.0

[[devices]]
name = "left_drive"
kind = "motor"
reversed = true
max_rpm = 435.0

[[devices]]
name = "claw"
kind = "servo"
initial_position = 0.5

[[devices]]
name = "odometry"
kind = "three_wheel_odometry"
"#,
    );

    let config = RosterConfig::from_file(&path).expect("valid roster");
    assert_eq!(config.shared.log_level, LogLevel::Debug);
    assert_eq!(config.sync.cadence_ms, 10);
    assert_eq!(config.sync.grace_delay_us, 500);
    assert_eq!(config.sync.cadence_mode, CadenceMode::Spin);

    let kinds: Vec<DeviceKind> = config.devices.iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![
            DeviceKind::DistanceSensor,
            DeviceKind::Motor,
            DeviceKind::Servo,
            DeviceKind::ThreeWheelOdometry,
        ]
    );
    assert!(config.devices[1].reversed);
    assert_eq!(config.devices[1].max_rpm, 435.0);
    assert_eq!(config.devices[2].initial_position, 0.5);
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = RosterConfig::from_file(&dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::FileNotFound)));
}

#[test]
fn test_duplicate_device_names_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_roster(
        &dir,
        r#"
[shared]
service_name = "rover-hal"

[[devices]]
name = "lift"
kind = "motor"

[[devices]]
name = "lift"
kind = "servo"
"#,
    );

    match RosterConfig::from_file(&path) {
        Err(ConfigError::ValidationError(msg)) => assert!(msg.contains("lift"), "{msg}"),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn test_unknown_kind_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_roster(
        &dir,
        r#"
[shared]
service_name = "rover-hal"

[[devices]]
name = "webcam"
kind = "camera"
"#,
    );

    assert!(matches!(
        RosterConfig::from_file(&path),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn test_unknown_field_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_roster(
        &dir,
        r#"
[shared]
service_name = "rover-hal"

[[devices]]
name = "lift"
kind = "motor"
gear_ratio = 3.0
"#,
    );

    assert!(matches!(
        RosterConfig::from_file(&path),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn test_empty_roster_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_roster(&dir, "[shared]\nservice_name = \"rover-hal\"\n");
    assert!(matches!(
        RosterConfig::from_file(&path),
        Err(ConfigError::ValidationError(_))
    ));
}

#[test]
fn test_too_many_devices_rejected() {
    let mut body = String::from("[shared]\nservice_name = \"rover-hal\"\n");
    for i in 0..=MAX_DEVICES {
        body.push_str(&format!(
            "\n[[devices]]\nname = \"sensor_{i}\"\nkind = \"distance_sensor\"\n"
        ));
    }

    let dir = TempDir::new().unwrap();
    let path = write_roster(&dir, &body);
    match RosterConfig::from_file(&path) {
        Err(ConfigError::ValidationError(msg)) => assert!(msg.contains("Too many devices")),
        other => panic!("expected validation error, got {other:?}"),
    }
}
