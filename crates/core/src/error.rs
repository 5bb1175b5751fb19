// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for sg-core operations.

use thiserror::Error;

/// All possible errors that can occur in sg-core operations.
///
/// Evaluation itself never fails; these only surface when parsing
/// user-supplied names for the core enumerations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("invalid power source: '{0}'\n  hint: valid values are: charger_only, battery_only, either")]
    InvalidPowerSource(String),

    #[error("invalid transport: '{0}'\n  hint: valid values are: cellular, wifi, ethernet, bluetooth_pan")]
    InvalidTransport(String),

    #[error("invalid lifecycle state: '{0}'\n  hint: valid states are: init, starting, active, disabled, error")]
    InvalidState(String),

    #[error("invalid block reason: '{0}'")]
    InvalidReason(String),
}

/// A specialized Result type for sg-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
