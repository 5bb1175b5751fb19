// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Run-condition preferences.
//!
//! A [`RunConditionConfig`] is a snapshot of the user's preferences taken at
//! evaluation time. It is never shared between evaluations: callers read a
//! fresh copy from persisted settings each time.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Which power source the daemon may run on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerSource {
    /// Only run while plugged in.
    ChargerOnly,
    /// Only run while on battery.
    BatteryOnly,
    /// No power source restriction.
    #[default]
    Either,
}

impl PowerSource {
    /// Returns the string representation used in settings and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerSource::ChargerOnly => "charger_only",
            PowerSource::BatteryOnly => "battery_only",
            PowerSource::Either => "either",
        }
    }
}

impl fmt::Display for PowerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PowerSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "charger_only" | "charger" => Ok(PowerSource::ChargerOnly),
            "battery_only" | "battery" => Ok(PowerSource::BatteryOnly),
            "either" | "any" => Ok(PowerSource::Either),
            _ => Err(Error::InvalidPowerSource(s.to_string())),
        }
    }
}

/// User preferences that gate whether the sync daemon may run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConditionConfig {
    /// Master switch. When off, the daemon always runs.
    #[serde(rename = "enabled")]
    pub conditions_enabled: bool,
    pub run_on_mobile_data: bool,
    pub run_on_wifi: bool,
    /// Allow running on Wi-Fi networks flagged as metered.
    pub run_on_metered_wifi: bool,
    /// SSIDs the daemon may run on. Empty means any SSID.
    pub wifi_ssid_whitelist: BTreeSet<String>,
    /// Allow running with no network transport at all.
    pub run_in_flight_mode: bool,
    pub power_source: PowerSource,
    pub respect_power_saving: bool,
    /// Honour the global sync toggle.
    pub respect_global_sync: bool,
}

impl Default for RunConditionConfig {
    fn default() -> Self {
        Self {
            conditions_enabled: true,
            run_on_mobile_data: false,
            run_on_wifi: true,
            run_on_metered_wifi: false,
            wifi_ssid_whitelist: BTreeSet::new(),
            run_in_flight_mode: false,
            power_source: PowerSource::Either,
            respect_power_saving: true,
            respect_global_sync: false,
        }
    }
}

impl RunConditionConfig {
    /// A configuration with the conditions feature switched off.
    pub fn disabled() -> Self {
        Self {
            conditions_enabled: false,
            ..Self::default()
        }
    }

    /// Returns true if the current SSID satisfies the whitelist.
    ///
    /// An empty whitelist accepts every network, including one whose SSID
    /// could not be determined.
    pub fn ssid_whitelisted(&self, ssid: Option<&str>) -> bool {
        if self.wifi_ssid_whitelist.is_empty() {
            return true;
        }
        ssid.is_some_and(|s| self.wifi_ssid_whitelist.contains(s))
    }
}

#[cfg(test)]
#[path = "condition_tests.rs"]
mod tests;
