// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Commands forwarded to the running supervisor.
//!
//! Each one maps to a single request. The supervisor refuses them with an
//! explanation when the daemon is not in a state that allows them.

use std::io::Write;
use std::path::Path;

use sg_ipc::DaemonRequest;

use crate::cli::Command;
use crate::error::Result;
use crate::supervisor;

/// The request for a control command and the line printed on success.
///
/// Returns `None` for commands that are not forwarded.
pub fn request_for(command: Command) -> Option<(DaemonRequest, &'static str)> {
    let mapped = match command {
        Command::Restart => (DaemonRequest::Restart, "Restarting syncthing."),
        Command::ResetDatabase => (
            DaemonRequest::ResetDatabase,
            "Resetting the database; syncthing will restart.",
        ),
        Command::ResetDeltas => (
            DaemonRequest::ResetDeltas,
            "Resetting delta indexes; syncthing will restart.",
        ),
        Command::Refresh => (
            DaemonRequest::RefreshNetworkInfo,
            "Run conditions re-evaluated.",
        ),
        Command::IgnoreDevice {
            device_id,
            name,
            address,
        } => (
            DaemonRequest::IgnoreDevice {
                device_id,
                name,
                address,
            },
            "Device ignored.",
        ),
        Command::IgnoreFolder {
            device_id,
            folder_id,
            label,
        } => (
            DaemonRequest::IgnoreFolder {
                device_id,
                folder_id,
                label,
            },
            "Folder ignored.",
        ),
        Command::Override { folder_id } => (
            DaemonRequest::OverrideChanges { folder_id },
            "Remote changes overridden.",
        ),
        _ => return None,
    };
    Some(mapped)
}

/// Send `request` and report success.
pub fn run(
    state_dir: &Path,
    request: &DaemonRequest,
    done: &str,
    out: &mut impl Write,
) -> Result<()> {
    supervisor::send(state_dir, request)?;
    writeln!(out, "{}", done)?;
    Ok(())
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
