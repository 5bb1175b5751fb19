// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the supervisor.
//!
//! Variable name constants are generated by `build.rs` and live in the
//! [`vars`] submodule.

use std::path::PathBuf;

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_names.rs"));
}

/// Returns the value of `SYNCGUARD_STATE_DIR` if set.
pub fn state_dir() -> Option<PathBuf> {
    std::env::var(vars::SYNCGUARD_STATE_DIR)
        .ok()
        .map(PathBuf::from)
}

/// Returns the value of `SYNCGUARD_CONFIG` if set.
pub fn config_path() -> Option<PathBuf> {
    std::env::var(vars::SYNCGUARD_CONFIG).ok().map(PathBuf::from)
}

/// Returns the value of `XDG_STATE_HOME` if set.
pub fn xdg_state_home() -> Option<PathBuf> {
    std::env::var(vars::XDG_STATE_HOME).ok().map(PathBuf::from)
}

/// Resolve the supervisor state directory.
///
/// `SYNCGUARD_STATE_DIR` wins, then `$XDG_STATE_HOME/syncguard`, then
/// `~/.local/state/syncguard`.
pub fn default_state_dir() -> PathBuf {
    if let Some(dir) = state_dir() {
        return dir;
    }
    if let Some(dir) = xdg_state_home() {
        return dir.join("syncguard");
    }
    dirs::home_dir()
        .map(|h| h.join(".local/state/syncguard"))
        .unwrap_or_else(|| PathBuf::from(".local/state/syncguard"))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
