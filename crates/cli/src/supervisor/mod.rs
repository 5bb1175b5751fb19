// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Talking to the `syncguardd` supervisor.
//!
//! The supervisor runs in the background and answers one framed request
//! per connection on `<state_dir>/daemon.sock`.

mod client;
mod lifecycle;

pub use client::SupervisorClient;
pub use lifecycle::{
    detect_supervisor, hello, pid_path, request, send, socket_path, spawn_supervisor, status,
    stop_supervisor, SupervisorInfo,
};

#[cfg(test)]
pub(crate) mod testing;
