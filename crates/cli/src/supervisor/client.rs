// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! IPC client for the supervisor socket.

use std::io;
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

use sg_ipc::{framing, DaemonRequest, DaemonResponse};

use crate::error::{Error, Result};

/// A single-request connection to the supervisor.
pub struct SupervisorClient {
    stream: UnixStream,
}

impl SupervisorClient {
    /// Connect to the supervisor at `socket_path`.
    ///
    /// A missing socket or a refused connection means no supervisor is
    /// listening and maps to [`Error::NotRunning`].
    pub fn connect(socket_path: &Path, timeout: Duration) -> Result<Self> {
        let stream = UnixStream::connect(socket_path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused => Error::NotRunning,
            _ => Error::Supervisor(format!("failed to connect to supervisor: {}", e)),
        })?;

        stream
            .set_read_timeout(Some(timeout))
            .map_err(|e| Error::Supervisor(format!("failed to set read timeout: {}", e)))?;
        stream
            .set_write_timeout(Some(timeout))
            .map_err(|e| Error::Supervisor(format!("failed to set write timeout: {}", e)))?;

        Ok(SupervisorClient { stream })
    }

    /// Send `request` and wait for the response, consuming the connection.
    pub fn request(mut self, request: &DaemonRequest) -> Result<DaemonResponse> {
        framing::write_request(&mut self.stream, request)?;
        Ok(framing::read_response(&mut self.stream)?)
    }
}
