// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! In-process stand-in for `syncguardd`.

#![allow(clippy::unwrap_used)]

use std::os::unix::net::UnixListener;
use std::path::Path;
use std::thread::{self, JoinHandle};

use sg_ipc::{framing, DaemonRequest, DaemonResponse};

use super::socket_path;

/// Answer `count` connections on the state dir socket with `reply`.
///
/// Joining the handle returns the requests seen, in order.
pub fn fake_supervisor(
    state_dir: &Path,
    count: usize,
    reply: fn(&DaemonRequest) -> DaemonResponse,
) -> JoinHandle<Vec<DaemonRequest>> {
    let listener = UnixListener::bind(socket_path(state_dir)).unwrap();
    thread::spawn(move || {
        let mut seen = Vec::new();
        for stream in listener.incoming().take(count) {
            let mut stream = stream.unwrap();
            let request = framing::read_request(&mut stream).unwrap();
            framing::write_response(&mut stream, &reply(&request)).unwrap();
            seen.push(request);
        }
        seen
    })
}
