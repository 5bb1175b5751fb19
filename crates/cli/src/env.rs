// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! Variables read by the CLI itself live here; the state directory and
//! settings path are resolved by the supervisor library so both binaries
//! agree on them. Name constants are generated by `build.rs`.

use std::path::PathBuf;

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

/// Returns `true` if `NO_COLOR=1`.
pub fn no_color() -> bool {
    std::env::var(vars::NO_COLOR).is_ok_and(|v| v == "1")
}

/// Returns `true` if `COLOR=1`.
pub fn force_color() -> bool {
    std::env::var(vars::COLOR).is_ok_and(|v| v == "1")
}

/// Returns the value of `SYNCGUARD_DAEMON_BINARY` if set.
pub fn daemon_binary() -> Option<PathBuf> {
    std::env::var(vars::SYNCGUARD_DAEMON_BINARY)
        .ok()
        .map(PathBuf::from)
}

/// Supervisor state directory (socket, PID file, logs, pause marker).
pub fn state_dir() -> PathBuf {
    sgd::env::default_state_dir()
}

/// Settings file shared with the supervisor.
pub fn settings_path() -> PathBuf {
    sgd::settings::Settings::default_path()
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
