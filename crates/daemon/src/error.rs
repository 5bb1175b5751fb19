// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the supervisor.

use sg_core::LifecycleState;
use thiserror::Error;

/// All errors surfaced by the supervisor library.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config unreadable: {0}")]
    ConfigUnreadable(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("cannot {action} while the daemon is {actual}\n  hint: {action} requires the daemon to be active")]
    NotActive {
        action: &'static str,
        actual: LifecycleState,
    },

    #[error("cannot {action} while the daemon is {actual}\n  hint: restart syncguardd after fixing the configuration")]
    Unrecoverable {
        action: &'static str,
        actual: LifecycleState,
    },

    #[error("cannot {action} while storage permission is revoked\n  hint: restore write access to the syncthing home directory")]
    StorageRevoked { action: &'static str },

    #[error("failed to launch {binary}: {source}")]
    Launch {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} timed out after {secs}s")]
    Timeout { command: String, secs: u64 },

    #[error("{command} exited with status {code}: {output}")]
    CommandFailed {
        command: String,
        code: i32,
        output: String,
    },

    #[error("admin client has been released")]
    AdminReleased,

    #[error("admin API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("controller is not running")]
    ControllerStopped,

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("settings error: {0}")]
    Settings(#[from] toml::de::Error),

    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for supervisor operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
