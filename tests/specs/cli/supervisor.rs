// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor commands when no supervisor is running.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use yare::parameterized;

fn sg(state: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("syncguard");
    cmd.env("NO_COLOR", "1")
        .env("SYNCGUARD_STATE_DIR", state.path());
    cmd
}

#[parameterized(
    status = { &["status"] },
    status_json = { &["status", "-o", "json"] },
    restart = { &["restart"] },
    reset_database = { &["reset-database"] },
    reset_deltas = { &["reset-deltas"] },
    refresh = { &["refresh"] },
    ignore_device = { &["ignore-device", "AAAA-BBBB"] },
    ignore_folder = { &["ignore-folder", "AAAA-BBBB", "photos"] },
    override_changes = { &["override", "photos"] },
)]
fn requests_need_a_running_supervisor(args: &[&str]) {
    let state = TempDir::new().unwrap();
    sg(&state)
        .args(args)
        .assert()
        .failure()
        .stderr(predicate::str::contains("supervisor is not running"))
        .stderr(predicate::str::contains("syncguard start"));
}

#[test]
fn stop_when_not_running_succeeds() {
    let state = TempDir::new().unwrap();
    sg(&state)
        .arg("stop")
        .assert()
        .success()
        .stdout("Supervisor is not running.\n");
}

#[test]
fn stop_cleans_up_stale_files() {
    let state = TempDir::new().unwrap();
    std::fs::write(state.path().join("daemon.sock"), "").unwrap();
    std::fs::write(state.path().join("daemon.pid"), "999999999").unwrap();

    sg(&state).arg("stop").assert().success();
    assert!(!state.path().join("daemon.sock").exists());
    assert!(!state.path().join("daemon.pid").exists());
}

#[test]
fn start_reports_missing_supervisor_binary() {
    let state = TempDir::new().unwrap();
    sg(&state)
        .env(
            "SYNCGUARD_DAEMON_BINARY",
            state.path().join("no-such-syncguardd"),
        )
        .arg("start")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to start syncguardd"));
}

#[test]
fn pause_and_resume_toggle_marker() {
    let state = TempDir::new().unwrap();
    let marker = state.path().join("sync.paused");

    sg(&state)
        .arg("pause")
        .assert()
        .success()
        .stdout("Sync paused.\n");
    assert!(marker.exists());

    sg(&state)
        .arg("pause")
        .assert()
        .success()
        .stdout("Sync is already paused.\n");

    sg(&state)
        .arg("resume")
        .assert()
        .success()
        .stdout("Sync resumed.\n");
    assert!(!marker.exists());

    sg(&state)
        .arg("resume")
        .assert()
        .success()
        .stdout("Sync is not paused.\n");
}

#[test]
fn logs_print_existing_log() {
    let state = TempDir::new().unwrap();
    std::fs::write(state.path().join("supervisor.log"), "started\n").unwrap();
    std::fs::write(state.path().join("syncthing.log"), "[syncthing] ready\n").unwrap();

    sg(&state).arg("logs").assert().success().stdout("started\n");
    sg(&state)
        .args(["logs", "--daemon"])
        .assert()
        .success()
        .stdout("[syncthing] ready\n");
}

#[test]
fn logs_without_file_fail_with_hint() {
    let state = TempDir::new().unwrap();
    sg(&state)
        .arg("logs")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no log file"));
}
