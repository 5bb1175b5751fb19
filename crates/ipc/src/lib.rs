// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared IPC protocol for CLI-supervisor communication.
//!
//! This crate defines the message types and framing protocol used between
//! the `syncguard` CLI and the `syncguardd` supervisor. Messages are
//! serialized as JSON with length-prefixed framing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use sg_core::{BlockReason, LifecycleState};

// ============================================================================
// Protocol types
// ============================================================================

/// Request sent from CLI to supervisor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum DaemonRequest {
    /// Get supervisor status.
    Status,
    /// Graceful shutdown of the supervisor (stops the sync daemon too).
    Shutdown,
    /// Ping to check if the supervisor is alive.
    Ping,
    /// Version handshake request.
    Hello { version: String },
    /// Restart the sync daemon.
    Restart,
    /// Stop, reset the daemon's database, start again.
    ResetDatabase,
    /// Stop, reset the daemon's delta indexes, start again.
    ResetDeltas,
    /// Re-evaluate run conditions now.
    RefreshNetworkInfo,
    /// Ignore a remote device that asked to connect.
    IgnoreDevice {
        device_id: String,
        name: String,
        address: String,
    },
    /// Ignore a folder a remote device offered.
    IgnoreFolder {
        device_id: String,
        folder_id: String,
        label: String,
    },
    /// Override remote changes on a send-only folder.
    OverrideChanges { folder_id: String },
}

/// Response sent from supervisor to CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum DaemonResponse {
    /// Status response.
    Status(SupervisorStatus),
    /// Shutdown acknowledged.
    ShuttingDown,
    /// Pong response.
    Pong,
    /// Command accepted.
    Ok,
    /// Error response.
    Error { message: String },
    /// Version handshake response.
    Hello { version: String },
}

/// Supervisor status information.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupervisorStatus {
    /// Supervisor PID.
    pub pid: u32,
    /// Supervisor uptime in seconds.
    pub uptime_secs: u64,
    /// Lifecycle state of the sync daemon.
    pub state: LifecycleState,
    /// When the current state was entered.
    pub since: DateTime<Utc>,
    /// Whether run conditions currently allow the daemon to run.
    pub should_run: bool,
    /// Why the daemon may not run, in evaluation order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<BlockReason>,
    /// PID of the sync daemon, when one is running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daemon_pid: Option<u32>,
}

impl SupervisorStatus {
    /// Create a status for a supervisor whose daemon is in `state`.
    pub fn new(pid: u32, uptime_secs: u64, state: LifecycleState, since: DateTime<Utc>) -> Self {
        Self {
            pid,
            uptime_secs,
            state,
            since,
            should_run: false,
            reasons: Vec::new(),
            daemon_pid: None,
        }
    }
}

/// IPC message framing.
///
/// Messages are framed as:
/// - 4 bytes: message length (big-endian u32)
/// - N bytes: JSON-encoded message
pub mod framing {
    use std::io::{self, Read, Write};

    use serde::de::DeserializeOwned;
    use serde::Serialize;

    use super::{DaemonRequest, DaemonResponse};

    /// Maximum message size (1MB) to prevent malformed messages from causing hangs.
    pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

    fn write_message<W: Write, T: Serialize>(writer: &mut W, message: &T) -> io::Result<()> {
        let json = serde_json::to_vec(message)
            .map_err(|e| io::Error::other(format!("serialize error: {}", e)))?;
        let len = u32::try_from(json.len())
            .map_err(|_| io::Error::other("message too large".to_string()))?;
        writer.write_all(&len.to_be_bytes())?;
        writer.write_all(&json)?;
        writer.flush()
    }

    fn read_message<R: Read, T: DeserializeOwned>(reader: &mut R) -> io::Result<T> {
        let mut len_buf = [0u8; 4];
        reader.read_exact(&mut len_buf)?;
        let len = u32::from_be_bytes(len_buf) as usize;

        if len > MAX_MESSAGE_SIZE {
            return Err(io::Error::other(format!(
                "message too large: {} bytes (max {})",
                len, MAX_MESSAGE_SIZE
            )));
        }

        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf)?;

        serde_json::from_slice(&buf)
            .map_err(|e| io::Error::other(format!("deserialize error: {}", e)))
    }

    /// Write a request to the given writer.
    pub fn write_request<W: Write>(writer: &mut W, request: &DaemonRequest) -> io::Result<()> {
        write_message(writer, request)
    }

    /// Read a request from the given reader.
    pub fn read_request<R: Read>(reader: &mut R) -> io::Result<DaemonRequest> {
        read_message(reader)
    }

    /// Write a response to the given writer.
    pub fn write_response<W: Write>(writer: &mut W, response: &DaemonResponse) -> io::Result<()> {
        write_message(writer, response)
    }

    /// Read a response from the given reader.
    pub fn read_response<R: Read>(reader: &mut R) -> io::Result<DaemonResponse> {
        read_message(reader)
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
