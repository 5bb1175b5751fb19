// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! syncguard supervisor library.
//!
//! Decides when the syncthing daemon should run and drives its lifecycle:
//! signal sources feed the [`monitor`], whose decisions drive the
//! [`controller`] state machine, which launches and stops the daemon
//! through the [`runtime`] and talks to it through the [`admin`] client.

pub mod admin;
pub mod cancel;
pub mod config_xml;
pub mod controller;
pub mod env;
pub mod error;
pub mod listeners;
pub mod monitor;
pub mod notifier;
pub mod process;
pub mod runtime;
pub mod sensors;
#[cfg(unix)]
pub mod server;
pub mod service;
pub mod settings;
pub mod signals;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};

/// Socket filename within the state directory.
pub const SOCKET_NAME: &str = "daemon.sock";
/// PID filename within the state directory.
pub const PID_NAME: &str = "daemon.pid";
/// Lock filename for the single instance guarantee.
pub const LOCK_NAME: &str = "daemon.lock";
/// Supervisor log filename.
pub const LOG_NAME: &str = "supervisor.log";
/// Daemon output log filename.
pub const OUTPUT_LOG_NAME: &str = "syncthing.log";
/// Global sync is off while this marker exists.
pub const PAUSE_MARKER_NAME: &str = "sync.paused";
