// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `syncguard check` evaluates run conditions without a supervisor.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A CLI bound to a temp state dir and the given settings file content.
fn sg(temp: &TempDir, settings: &str) -> Command {
    let config = temp.path().join("config.toml");
    std::fs::write(&config, settings).unwrap();
    let mut cmd = cargo_bin_cmd!("syncguard");
    cmd.env("NO_COLOR", "1")
        .env("SYNCGUARD_STATE_DIR", temp.path().join("state"))
        .env("SYNCGUARD_CONFIG", config);
    cmd
}

#[test]
fn disabled_conditions_always_run() {
    let temp = TempDir::new().unwrap();
    sg(&temp, "[run_conditions]\nenabled = false\n")
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("power:"))
        .stdout(predicate::str::contains("network:"))
        .stdout(predicate::str::ends_with("syncthing should run\n"));
}

#[test]
fn json_output_has_decision_and_sensors() {
    let temp = TempDir::new().unwrap();
    let output = sg(&temp, "[run_conditions]\nenabled = false\n")
        .args(["check", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["should_run"], true);
    assert_eq!(value["reasons"], serde_json::json!([]));
    assert!(value["sensors"]["charging"].is_boolean());
}

#[test]
fn pause_marker_blocks_when_global_sync_is_respected() {
    let temp = TempDir::new().unwrap();
    let settings = "\
[run_conditions]
respect_global_sync = true
run_in_flight_mode = true
run_on_mobile_data = true
";
    sg(&temp, settings).arg("pause").assert().success();

    let output = sg(&temp, settings)
        .args(["check", "-o", "json"])
        .output()
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["should_run"], false);
    assert!(value["reasons"]
        .as_array()
        .unwrap()
        .contains(&serde_json::json!("global_sync_disabled")));
}

#[test]
fn broken_settings_fail() {
    let temp = TempDir::new().unwrap();
    sg(&temp, "[run_conditions\n")
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("error: settings error:"));
}

#[test]
fn missing_settings_file_uses_defaults() {
    let temp = TempDir::new().unwrap();
    cargo_bin_cmd!("syncguard")
        .env("SYNCGUARD_STATE_DIR", temp.path())
        .env("SYNCGUARD_CONFIG", temp.path().join("absent.toml"))
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("syncthing should"));
}
