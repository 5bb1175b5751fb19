// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The outcome of a run-condition evaluation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Why the sync daemon is not allowed to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    OnBattery,
    OnCharger,
    PowerSavingEnabled,
    GlobalSyncDisabled,
    WifiSsidNotWhitelisted,
    WifiIsMetered,
    NoNetworkOrFlightMode,
    NoMobileConnection,
    NoWifiConnection,
    NoAllowedNetwork,
}

impl BlockReason {
    /// Every reason, in declaration order.
    pub const ALL: [BlockReason; 10] = [
        BlockReason::OnBattery,
        BlockReason::OnCharger,
        BlockReason::PowerSavingEnabled,
        BlockReason::GlobalSyncDisabled,
        BlockReason::WifiSsidNotWhitelisted,
        BlockReason::WifiIsMetered,
        BlockReason::NoNetworkOrFlightMode,
        BlockReason::NoMobileConnection,
        BlockReason::NoWifiConnection,
        BlockReason::NoAllowedNetwork,
    ];

    /// Stable message key. Presentation layers map keys to text.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockReason::OnBattery => "on_battery",
            BlockReason::OnCharger => "on_charger",
            BlockReason::PowerSavingEnabled => "power_saving_enabled",
            BlockReason::GlobalSyncDisabled => "global_sync_disabled",
            BlockReason::WifiSsidNotWhitelisted => "wifi_ssid_not_whitelisted",
            BlockReason::WifiIsMetered => "wifi_is_metered",
            BlockReason::NoNetworkOrFlightMode => "no_network_or_flight_mode",
            BlockReason::NoMobileConnection => "no_mobile_connection",
            BlockReason::NoWifiConnection => "no_wifi_connection",
            BlockReason::NoAllowedNetwork => "no_allowed_network",
        }
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BlockReason {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        BlockReason::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| Error::InvalidReason(s.to_string()))
    }
}

/// Result of evaluating run conditions.
///
/// The daemon should run exactly when there are no blocking reasons. Two
/// decisions are equal when they carry the same reasons in the same order,
/// which lets observers drop repeated identical evaluations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunDecision {
    reasons: Vec<BlockReason>,
}

impl RunDecision {
    /// The canonical "should run" decision.
    pub const RUN: RunDecision = RunDecision {
        reasons: Vec::new(),
    };

    /// Builds a decision from blocking reasons in evaluation order.
    pub fn blocked(reasons: Vec<BlockReason>) -> Self {
        Self { reasons }
    }

    pub fn should_run(&self) -> bool {
        self.reasons.is_empty()
    }

    /// Blocking reasons, in evaluation order.
    pub fn reasons(&self) -> &[BlockReason] {
        &self.reasons
    }
}

impl Default for RunDecision {
    fn default() -> Self {
        Self::RUN
    }
}

impl fmt::Display for RunDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.should_run() {
            return write!(f, "run");
        }
        let keys: Vec<&str> = self.reasons.iter().map(BlockReason::as_str).collect();
        write!(f, "blocked ({})", keys.join(", "))
    }
}

#[cfg(test)]
#[path = "decision_tests.rs"]
mod tests;
