// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Run-condition evaluation.
//!
//! Evaluation order:
//! 1. Conditions switched off: always run.
//! 2. Hard blockers (power source, power saving, global sync) are all
//!    collected; none of them short-circuits the others.
//! 3. Connectivity is searched in order mobile, Wi-Fi, flight mode and
//!    stops at the first branch that applies.
//! 4. Connectivity only lets the daemon run when no hard blocker was found.
//! 5. When nothing has explained the refusal yet, exactly one fallback
//!    reason describes the network situation.

use crate::condition::{PowerSource, RunConditionConfig};
use crate::decision::{BlockReason, RunDecision};
use crate::sensors::{SensorSnapshot, Transport};

/// Decide whether the sync daemon should run.
pub fn evaluate(config: &RunConditionConfig, sensors: &SensorSnapshot) -> RunDecision {
    if !config.conditions_enabled {
        return RunDecision::RUN;
    }

    let mut reasons = hard_blockers(config, sensors);
    let connectivity_ok = check_connectivity(config, sensors, &mut reasons);

    if connectivity_ok && reasons.is_empty() {
        return RunDecision::RUN;
    }

    if reasons.is_empty() {
        reasons.push(fallback_reason(config, sensors));
    }
    RunDecision::blocked(reasons)
}

fn hard_blockers(config: &RunConditionConfig, sensors: &SensorSnapshot) -> Vec<BlockReason> {
    let mut reasons = Vec::new();

    match config.power_source {
        PowerSource::ChargerOnly if !sensors.charging => reasons.push(BlockReason::OnBattery),
        PowerSource::BatteryOnly if sensors.charging => reasons.push(BlockReason::OnCharger),
        _ => {}
    }

    if config.respect_power_saving && sensors.power_saving {
        reasons.push(BlockReason::PowerSavingEnabled);
    }

    if config.respect_global_sync && !sensors.global_sync_enabled {
        reasons.push(BlockReason::GlobalSyncDisabled);
    }

    reasons
}

/// Returns true when the active network permits running.
///
/// Wi-Fi refusals record their reason in `reasons`.
fn check_connectivity(
    config: &RunConditionConfig,
    sensors: &SensorSnapshot,
    reasons: &mut Vec<BlockReason>,
) -> bool {
    let transport = sensors.transport;

    if config.run_on_mobile_data && transport == Some(Transport::Cellular) {
        return true;
    }

    if config.run_on_wifi && transport.is_some_and(|t| t.is_wifi_like()) {
        if !config.run_on_metered_wifi && sensors.metered {
            reasons.push(BlockReason::WifiIsMetered);
            return false;
        }
        if config.ssid_whitelisted(sensors.ssid.as_deref()) {
            return true;
        }
        reasons.push(BlockReason::WifiSsidNotWhitelisted);
        return false;
    }

    config.run_in_flight_mode && transport.is_none()
}

fn fallback_reason(config: &RunConditionConfig, sensors: &SensorSnapshot) -> BlockReason {
    if sensors.offline() {
        BlockReason::NoNetworkOrFlightMode
    } else if !config.run_on_wifi && !config.run_on_mobile_data {
        BlockReason::NoAllowedNetwork
    } else if config.run_on_mobile_data {
        BlockReason::NoMobileConnection
    } else {
        BlockReason::NoWifiConnection
    }
}

#[cfg(test)]
#[path = "evaluate_tests.rs"]
mod tests;
