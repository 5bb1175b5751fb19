// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle states of the supervised sync daemon.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Where the supervised daemon is in its lifecycle.
///
/// ```text
/// Disabled ──run──▶ Starting ──reachable──▶ Active
///    ▲                 │                      │
///    └────stop─────────┴──────────stop────────┘
/// Init: torn down, about to start again (restart, reset)
/// Error: configuration unusable, needs outside intervention
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Stopped on purpose and about to be started again.
    Init,
    /// Startup task in flight; the daemon may already be running.
    Starting,
    /// Daemon reachable and admin client bound.
    Active,
    /// Stopped because run conditions say so.
    #[default]
    Disabled,
    /// Unrecoverable configuration failure.
    Error,
}

impl LifecycleState {
    /// Returns the string representation used in status output.
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Init => "init",
            LifecycleState::Starting => "starting",
            LifecycleState::Active => "active",
            LifecycleState::Disabled => "disabled",
            LifecycleState::Error => "error",
        }
    }

    /// States from which a new startup task may be launched.
    pub fn can_launch(&self) -> bool {
        matches!(self, LifecycleState::Disabled | LifecycleState::Init)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LifecycleState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "init" => Ok(LifecycleState::Init),
            "starting" => Ok(LifecycleState::Starting),
            "active" => Ok(LifecycleState::Active),
            "disabled" => Ok(LifecycleState::Disabled),
            "error" => Ok(LifecycleState::Error),
            _ => Err(Error::InvalidState(s.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
