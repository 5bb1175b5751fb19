// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Device signals consumed by run-condition evaluation.
//!
//! Sensors are stateless queries against the operating system. The
//! evaluator only ever sees a [`SensorSnapshot`], so any source of
//! readings (sysfs, a test fixture, a replayed trace) can drive it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use crate::error::{Error, Result};

/// Transport of the active network connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    Cellular,
    Wifi,
    Ethernet,
    BluetoothPan,
}

impl Transport {
    /// Returns the string representation used in display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Cellular => "cellular",
            Transport::Wifi => "wifi",
            Transport::Ethernet => "ethernet",
            Transport::BluetoothPan => "bluetooth_pan",
        }
    }

    /// Transports that count as "Wi-Fi" for run-condition purposes.
    pub fn is_wifi_like(&self) -> bool {
        matches!(
            self,
            Transport::Wifi | Transport::Ethernet | Transport::BluetoothPan
        )
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Transport {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "cellular" | "mobile" => Ok(Transport::Cellular),
            "wifi" => Ok(Transport::Wifi),
            "ethernet" => Ok(Transport::Ethernet),
            "bluetooth_pan" | "bluetooth" => Ok(Transport::BluetoothPan),
            _ => Err(Error::InvalidTransport(s.to_string())),
        }
    }
}

/// Instantaneous readings of every signal the evaluator looks at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    /// Device is connected to external power.
    pub charging: bool,
    /// OS power-saving mode is active.
    pub power_saving: bool,
    /// Active network transport, `None` when offline or in flight mode.
    pub transport: Option<Transport>,
    /// Active network is flagged as metered.
    pub metered: bool,
    /// SSID of the connected Wi-Fi network, when known.
    pub ssid: Option<String>,
    /// Global sync toggle (the OS-wide "auto-sync" switch).
    pub global_sync_enabled: bool,
}

impl Default for SensorSnapshot {
    fn default() -> Self {
        Self {
            charging: true,
            power_saving: false,
            transport: None,
            metered: false,
            ssid: None,
            global_sync_enabled: true,
        }
    }
}

impl SensorSnapshot {
    /// Returns true when no network transport is active.
    pub fn offline(&self) -> bool {
        self.transport.is_none()
    }
}

/// Source of sensor readings.
pub trait ConditionSensors: Send + Sync {
    /// Sample every signal now.
    fn snapshot(&self) -> SensorSnapshot;
}

/// Sensors returning a caller-controlled snapshot.
///
/// Used to replay conditions and to drive the monitor in tests.
#[derive(Debug, Default)]
pub struct FixedSensors {
    current: Mutex<SensorSnapshot>,
}

impl FixedSensors {
    pub fn new(snapshot: SensorSnapshot) -> Self {
        Self {
            current: Mutex::new(snapshot),
        }
    }

    /// Replace the reported snapshot.
    pub fn set(&self, snapshot: SensorSnapshot) {
        if let Ok(mut current) = self.current.lock() {
            *current = snapshot;
        }
    }

    /// Modify the reported snapshot in place.
    pub fn update(&self, f: impl FnOnce(&mut SensorSnapshot)) {
        if let Ok(mut current) = self.current.lock() {
            f(&mut current);
        }
    }
}

impl ConditionSensors for FixedSensors {
    fn snapshot(&self) -> SensorSnapshot {
        self.current
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "sensors_tests.rs"]
mod tests;
