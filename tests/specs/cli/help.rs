// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Help, version and completion output.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use yare::parameterized;

fn sg() -> Command {
    let mut cmd = cargo_bin_cmd!("syncguard");
    cmd.env("NO_COLOR", "1").env_remove("COLOR");
    cmd
}

#[test]
fn help_lists_command_groups() {
    sg().arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Supervisor:"))
        .stdout(predicate::str::contains("Daemon:"))
        .stdout(predicate::str::contains("ignore-device"))
        .stdout(predicate::str::contains("Get started:"));
}

#[test]
fn help_without_color_has_no_escapes() {
    sg().arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("\x1b[").not());
}

#[test]
fn forced_color_styles_help() {
    cargo_bin_cmd!("syncguard")
        .env("COLOR", "1")
        .env_remove("NO_COLOR")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("\x1b[38;5;74m"));
}

#[parameterized(
    short = { "-v" },
    short_alias = { "-V" },
    long = { "--version" },
)]
fn version_flags(flag: &str) {
    sg().arg(flag)
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[parameterized(
    start = { "start" },
    stop = { "stop" },
    status = { "status" },
    check = { "check" },
    pause = { "pause" },
    resume = { "resume" },
    logs = { "logs" },
    restart = { "restart" },
    reset_database = { "reset-database" },
    reset_deltas = { "reset-deltas" },
    refresh = { "refresh" },
    ignore_device = { "ignore-device" },
    ignore_folder = { "ignore-folder" },
    override_changes = { "override" },
    completion = { "completion" },
)]
fn command_supports_help_flag(command: &str) {
    sg().args([command, "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn unknown_command_fails() {
    sg().arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn ignore_device_without_id_shows_help() {
    sg().arg("ignore-device")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[parameterized(
    bash = { "bash", "_syncguard" },
    zsh = { "zsh", "#compdef syncguard" },
    fish = { "fish", "complete -c syncguard" },
)]
fn completion_generates_script(shell: &str, marker: &str) {
    sg().args(["completion", shell])
        .assert()
        .success()
        .stdout(predicate::str::contains(marker))
        .stdout(predicate::str::contains("reset-database"));
}

#[test]
fn completion_rejects_unknown_shell() {
    sg().args(["completion", "tcsh"]).assert().failure();
}
