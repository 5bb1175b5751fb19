// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! IPC server for `syncguard` CLI connections.
//!
//! One request per connection: read a framed request, answer with a framed
//! response, close. The loop ends after answering `Shutdown`.

use sg_ipc::{framing, DaemonRequest, DaemonResponse};
use std::os::unix::net::UnixListener;
use std::time::Duration;

use crate::admin::Pending;
use crate::error::Result;
use crate::service::Service;

/// Read/write timeout on client connections.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);
/// How long a request waits on an admin API call.
const ADMIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Accept connections until a client asks for shutdown.
pub fn serve(listener: &UnixListener, service: &Service) {
    for stream in listener.incoming() {
        match stream {
            Ok(mut stream) => {
                let _ = stream.set_read_timeout(Some(CLIENT_TIMEOUT));
                let _ = stream.set_write_timeout(Some(CLIENT_TIMEOUT));

                match framing::read_request(&mut stream) {
                    Ok(request) => {
                        tracing::debug!("request: {:?}", request);
                        let response = handle_request(request, service);
                        let should_shutdown = matches!(response, DaemonResponse::ShuttingDown);
                        let _ = framing::write_response(&mut stream, &response);
                        if should_shutdown {
                            tracing::info!("shutdown requested");
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("failed to read request: {}", e);
                    }
                }
            }
            Err(e) => {
                tracing::warn!("failed to accept connection: {}", e);
            }
        }
    }
}

pub fn handle_request(request: DaemonRequest, service: &Service) -> DaemonResponse {
    match request {
        DaemonRequest::Ping => DaemonResponse::Pong,
        DaemonRequest::Hello { version } => {
            if version != env!("CARGO_PKG_VERSION") {
                tracing::info!("client version {} differs from ours", version);
            }
            DaemonResponse::Hello {
                version: env!("CARGO_PKG_VERSION").to_string(),
            }
        }
        DaemonRequest::Status => DaemonResponse::Status(service.status()),
        DaemonRequest::Shutdown => DaemonResponse::ShuttingDown,
        DaemonRequest::Restart => respond(service.restart()),
        DaemonRequest::ResetDatabase => respond(service.reset_database()),
        DaemonRequest::ResetDeltas => respond(service.reset_deltas()),
        DaemonRequest::RefreshNetworkInfo => {
            service.refresh_network_info();
            DaemonResponse::Ok
        }
        DaemonRequest::IgnoreDevice {
            device_id,
            name,
            address,
        } => respond_pending(service.ignore_device(&device_id, &name, &address)),
        DaemonRequest::IgnoreFolder {
            device_id,
            folder_id,
            label,
        } => respond_pending(service.ignore_folder(&device_id, &folder_id, &label)),
        DaemonRequest::OverrideChanges { folder_id } => {
            respond_pending(service.override_changes(&folder_id))
        }
    }
}

fn respond(result: Result<()>) -> DaemonResponse {
    match result {
        Ok(()) => DaemonResponse::Ok,
        Err(e) => DaemonResponse::Error {
            message: e.to_string(),
        },
    }
}

fn respond_pending(pending: Result<Pending<()>>) -> DaemonResponse {
    respond(pending.and_then(|p| p.wait_timeout(ADMIN_TIMEOUT)))
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
