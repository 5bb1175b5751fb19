// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// All errors surfaced by the `syncguard` CLI.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("supervisor is not running\n  hint: start it with 'syncguard start'")]
    NotRunning,

    #[error("supervisor error: {0}")]
    Supervisor(String),

    #[error("{0}")]
    Rejected(String),

    #[error("unexpected response from supervisor: {0}")]
    UnexpectedResponse(String),

    #[error("supervisor version mismatch: supervisor is v{supervisor_version}, CLI is v{cli_version}\n  hint: restart it with 'syncguard stop && syncguard start'")]
    VersionMismatch {
        supervisor_version: String,
        cli_version: String,
    },

    #[error("no log file at {0}\n  hint: the supervisor writes it once started")]
    NoLog(String),

    #[error(transparent)]
    Settings(#[from] sgd::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for CLI operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
