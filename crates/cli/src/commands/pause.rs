// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Global sync switch.
//!
//! Sync is paused while a marker file exists in the state directory. The
//! supervisor watches the marker, so no running supervisor is needed.

use std::fs;
use std::path::{Path, PathBuf};

use sgd::PAUSE_MARKER_NAME;

use crate::error::Result;

pub fn marker_path(state_dir: &Path) -> PathBuf {
    state_dir.join(PAUSE_MARKER_NAME)
}

/// Create the marker. Returns `false` if sync was already paused.
pub fn pause(state_dir: &Path) -> Result<bool> {
    let marker = marker_path(state_dir);
    if marker.exists() {
        return Ok(false);
    }
    fs::create_dir_all(state_dir)?;
    fs::write(&marker, "")?;
    Ok(true)
}

/// Remove the marker. Returns `false` if sync was not paused.
pub fn resume(state_dir: &Path) -> Result<bool> {
    match fs::remove_file(marker_path(state_dir)) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[path = "pause_tests.rs"]
mod tests;
