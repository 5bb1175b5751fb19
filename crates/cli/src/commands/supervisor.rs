// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor management commands: start, stop, status, logs.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use sgd::{LOG_NAME, OUTPUT_LOG_NAME};

use crate::cli::OutputFormat;
use crate::colors;
use crate::display;
use crate::error::{Error, Result};
use crate::supervisor;

/// Start the supervisor, or check the one already running.
pub fn start(state_dir: &Path, out: &mut impl Write) -> Result<()> {
    match supervisor::detect_supervisor(state_dir)? {
        Some(info) => {
            supervisor::hello(state_dir)?;
            writeln!(out, "Supervisor is already running (PID: {})", info.pid)?;
        }
        None => {
            let info = supervisor::spawn_supervisor(state_dir)?;
            writeln!(out, "Supervisor started (PID: {})", info.pid)?;
        }
    }
    Ok(())
}

/// Stop the supervisor; the daemon it runs is stopped with it.
pub fn stop(state_dir: &Path, out: &mut impl Write) -> Result<()> {
    if supervisor::stop_supervisor(state_dir)? {
        writeln!(out, "Supervisor stopped.")?;
    } else {
        writeln!(out, "Supervisor is not running.")?;
    }
    Ok(())
}

/// Show daemon state and blocking reasons.
pub fn status(state_dir: &Path, output: OutputFormat, out: &mut impl Write) -> Result<()> {
    let status = supervisor::status(state_dir)?;
    match output {
        OutputFormat::Text => writeln!(
            out,
            "{}",
            display::format_status(&status, Utc::now(), colors::should_colorize())
        )?,
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&status)?)?,
    }
    Ok(())
}

/// Print (or follow) the supervisor log, or the daemon's output log.
pub fn logs(state_dir: &Path, follow: bool, daemon: bool, out: &mut impl Write) -> Result<()> {
    let log_path = state_dir.join(if daemon { OUTPUT_LOG_NAME } else { LOG_NAME });
    if !log_path.exists() {
        return Err(Error::NoLog(log_path.display().to_string()));
    }

    if follow {
        out.flush()?;
        let status = std::process::Command::new("tail")
            .arg("-f")
            .arg(&log_path)
            .status()?;
        if !status.success() {
            return Err(Error::Io(std::io::Error::other("tail command failed")));
        }
    } else {
        out.write_all(&fs::read(&log_path)?)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
