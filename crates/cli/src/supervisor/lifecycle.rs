// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor lifecycle: spawn, detect, request, stop.
//!
//! The supervisor (`syncguardd`) is spawned as a background process. Its
//! socket, PID file and logs live in the state directory
//! (`~/.local/state/syncguard/` by default).

use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use sg_ipc::{DaemonRequest, DaemonResponse, SupervisorStatus};
use sgd::{PID_NAME, SOCKET_NAME};

use crate::env;
use crate::error::{Error, Result};

use super::client::SupervisorClient;

/// Timeout for liveness probes.
const PING_TIMEOUT: Duration = Duration::from_secs(2);
/// Timeout for regular requests; the supervisor may wait 10s on syncthing.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
/// How long a graceful stop may take before the supervisor is killed.
/// Covers a deferred stop of a daemon that is still starting.
const STOP_TIMEOUT: Duration = Duration::from_secs(40);
/// How long `spawn_supervisor` polls the socket after `READY`.
const SPAWN_TIMEOUT: Duration = Duration::from_secs(3);

/// Information about a running supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorInfo {
    /// Process ID of the supervisor.
    pub pid: u32,
}

/// Socket path for the given state directory.
pub fn socket_path(state_dir: &Path) -> PathBuf {
    state_dir.join(SOCKET_NAME)
}

/// PID file path for the given state directory.
pub fn pid_path(state_dir: &Path) -> PathBuf {
    state_dir.join(PID_NAME)
}

/// Detect a responsive supervisor.
///
/// Returns `None` when nothing answers a ping, removing stale PID and
/// socket files on the way.
pub fn detect_supervisor(state_dir: &Path) -> Result<Option<SupervisorInfo>> {
    let socket = socket_path(state_dir);
    let pid_file = pid_path(state_dir);

    if !socket.exists() {
        if pid_file.exists() {
            let _ = fs::remove_file(&pid_file);
        }
        return Ok(None);
    }

    let alive = SupervisorClient::connect(&socket, PING_TIMEOUT)
        .and_then(|client| client.request(&DaemonRequest::Ping))
        .is_ok_and(|response| response == DaemonResponse::Pong);
    if !alive {
        tracing::debug!("no supervisor answering on {}", socket.display());
        cleanup_stale_files(state_dir);
        return Ok(None);
    }

    // A missing PID file means the supervisor is still starting up.
    Ok(read_pid_file(&pid_file)
        .filter(|pid| *pid > 0)
        .map(|pid| SupervisorInfo { pid }))
}

/// Send one request and return the raw response.
pub fn request(state_dir: &Path, request: &DaemonRequest) -> Result<DaemonResponse> {
    SupervisorClient::connect(&socket_path(state_dir), REQUEST_TIMEOUT)?.request(request)
}

/// Send a request that is answered with `Ok` on success.
///
/// A refusal (`Error { message }`) becomes [`Error::Rejected`] carrying the
/// supervisor's explanation.
pub fn send(state_dir: &Path, req: &DaemonRequest) -> Result<()> {
    match request(state_dir, req)? {
        DaemonResponse::Ok => Ok(()),
        DaemonResponse::Error { message } => Err(Error::Rejected(message)),
        other => Err(Error::UnexpectedResponse(format!("{:?}", other))),
    }
}

/// Fetch the supervisor status.
pub fn status(state_dir: &Path) -> Result<SupervisorStatus> {
    match request(state_dir, &DaemonRequest::Status)? {
        DaemonResponse::Status(status) => Ok(status),
        DaemonResponse::Error { message } => Err(Error::Rejected(message)),
        other => Err(Error::UnexpectedResponse(format!("{:?}", other))),
    }
}

/// Exchange versions with the supervisor.
pub fn hello(state_dir: &Path) -> Result<()> {
    let cli_version = env!("CARGO_PKG_VERSION").to_string();
    let response = request(
        state_dir,
        &DaemonRequest::Hello {
            version: cli_version.clone(),
        },
    )?;
    match response {
        DaemonResponse::Hello { version } if version == cli_version => Ok(()),
        DaemonResponse::Hello { version } => Err(Error::VersionMismatch {
            supervisor_version: version,
            cli_version,
        }),
        other => Err(Error::UnexpectedResponse(format!("{:?}", other))),
    }
}

/// Locate the `syncguardd` binary.
///
/// `SYNCGUARD_DAEMON_BINARY` wins, then a binary next to the current
/// executable, then `PATH`.
fn find_supervisor_binary() -> PathBuf {
    if let Some(path) = env::daemon_binary() {
        return path;
    }
    if let Ok(exe) = std::env::current_exe() {
        let sibling = exe.with_file_name("syncguardd");
        if sibling.exists() {
            return sibling;
        }
    }
    PathBuf::from("syncguardd")
}

/// Spawn a supervisor for `state_dir`, or return the one already running.
///
/// The supervisor prints `READY` once its socket is bound; a flock in the
/// state directory keeps a second instance from starting.
pub fn spawn_supervisor(state_dir: &Path) -> Result<SupervisorInfo> {
    if let Some(info) = detect_supervisor(state_dir)? {
        return Ok(info);
    }

    fs::create_dir_all(state_dir)?;
    let binary = find_supervisor_binary();

    let mut child = Command::new(&binary)
        .arg("--state-dir")
        .arg(state_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            Error::Supervisor(format!(
                "failed to start syncguardd ({}): {}",
                binary.display(),
                e
            ))
        })?;

    if let Some(stdout) = child.stdout.take() {
        for line in BufReader::new(stdout).lines() {
            match line {
                Ok(line) if line == "READY" => break,
                Ok(_) => continue,
                Err(_) => break,
            }
        }
    }

    let started = Instant::now();
    while started.elapsed() < SPAWN_TIMEOUT {
        if let Ok(Some(exit)) = child.try_wait() {
            let mut output = String::new();
            if let Some(mut stderr) = child.stderr.take() {
                let _ = stderr.read_to_string(&mut output);
            }
            return Err(Error::Supervisor(format!(
                "syncguardd exited with status: {}\n{}",
                exit,
                output.trim()
            )));
        }

        if let Some(info) = detect_supervisor(state_dir)? {
            return Ok(info);
        }
        std::thread::sleep(Duration::from_millis(10));
    }

    Err(Error::Supervisor(
        "syncguardd failed to start: could not connect after multiple attempts".to_string(),
    ))
}

/// Stop the supervisor, killing it if a graceful shutdown fails.
///
/// Returns `false` when no supervisor was running.
pub fn stop_supervisor(state_dir: &Path) -> Result<bool> {
    let pid = read_pid_file(&pid_path(state_dir)).filter(|pid| process_alive(*pid));

    let graceful = match request(state_dir, &DaemonRequest::Shutdown) {
        Ok(DaemonResponse::ShuttingDown) => true,
        Err(Error::NotRunning) if pid.is_none() => {
            cleanup_stale_files(state_dir);
            return Ok(false);
        }
        Ok(other) => {
            tracing::debug!("unexpected shutdown response: {:?}", other);
            false
        }
        Err(e) => {
            tracing::debug!("graceful shutdown failed: {}", e);
            false
        }
    };

    if let Some(pid) = pid {
        let exited = graceful && wait_for_process_exit(pid, STOP_TIMEOUT);
        if !exited && process_alive(pid) {
            tracing::debug!("killing supervisor {}", pid);
            let _ = Command::new("kill").arg("-9").arg(pid.to_string()).output();
            wait_for_process_exit(pid, Duration::from_secs(1));
        }
    }

    cleanup_stale_files(state_dir);
    Ok(graceful || pid.is_some())
}

/// Remove stale socket and PID files.
fn cleanup_stale_files(state_dir: &Path) {
    let _ = fs::remove_file(socket_path(state_dir));
    let _ = fs::remove_file(pid_path(state_dir));
}

pub(super) fn read_pid_file(pid_path: &Path) -> Option<u32> {
    fs::read_to_string(pid_path)
        .ok()
        .and_then(|s| s.trim().parse().ok())
}

fn process_alive(pid: u32) -> bool {
    Command::new("kill")
        .arg("-0")
        .arg(pid.to_string())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

/// Wait for a process to exit. Returns `true` if it did within `timeout`.
fn wait_for_process_exit(pid: u32, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if !process_alive(pid) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    false
}
