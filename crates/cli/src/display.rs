// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Human readable rendering of decisions and supervisor status.

use chrono::{DateTime, Utc};
use sg_core::{BlockReason, RunDecision, SensorSnapshot};
use sg_ipc::SupervisorStatus;

use crate::colors;

/// User-facing explanation for a blocking reason.
pub fn reason_text(reason: BlockReason) -> &'static str {
    match reason {
        BlockReason::OnBattery => "running on battery, syncing needs a charger",
        BlockReason::OnCharger => "charging, syncing is limited to battery power",
        BlockReason::PowerSavingEnabled => "power saving is on",
        BlockReason::GlobalSyncDisabled => "global sync is paused",
        BlockReason::WifiSsidNotWhitelisted => "connected Wi-Fi is not in the whitelist",
        BlockReason::WifiIsMetered => "connected Wi-Fi is metered",
        BlockReason::NoNetworkOrFlightMode => "no network connection",
        BlockReason::NoMobileConnection => "waiting for a mobile data connection",
        BlockReason::NoWifiConnection => "waiting for a Wi-Fi connection",
        BlockReason::NoAllowedNetwork => "no network type is allowed",
    }
}

fn format_reasons(reasons: &[BlockReason]) -> String {
    reasons
        .iter()
        .map(|r| format!("  - {}", reason_text(*r)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a duration in seconds as e.g. `2h 5m`.
pub fn format_uptime(secs: u64) -> String {
    let (days, hours, mins) = (secs / 86_400, secs / 3_600 % 24, secs / 60 % 60);
    match (days, hours, mins) {
        (0, 0, 0) => format!("{}s", secs),
        (0, 0, m) => format!("{}m", m),
        (0, h, m) => format!("{}h {}m", h, m),
        (d, h, _) => format!("{}d {}h", d, h),
    }
}

fn format_since(since: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = u64::try_from((now - since).num_seconds()).unwrap_or(0);
    format!("{} ago", format_uptime(secs))
}

/// Render `syncguard status` text output.
pub fn format_status(status: &SupervisorStatus, now: DateTime<Utc>, colorize: bool) -> String {
    let mut lines = vec![format!(
        "syncthing: {} (since {})",
        colors::state(status.state, colorize),
        format_since(status.since, now)
    )];
    if let Some(pid) = status.daemon_pid {
        lines.push(format!("  pid {}", pid));
    }
    if !status.should_run {
        lines.push("Not running because:".to_string());
        lines.push(format_reasons(&status.reasons));
    }
    lines.push(format!(
        "supervisor: pid {}, up {}",
        status.pid,
        format_uptime(status.uptime_secs)
    ));
    lines.join("\n")
}

/// Render `syncguard check` text output.
pub fn format_decision(decision: &RunDecision, sensors: &SensorSnapshot) -> String {
    let network = match (&sensors.transport, &sensors.ssid) {
        (None, _) => "offline".to_string(),
        (Some(t), Some(ssid)) => format!("{} ({})", t, ssid),
        (Some(t), None) => t.to_string(),
    };
    let mut lines = vec![
        format!(
            "power:   {}{}",
            if sensors.charging { "charger" } else { "battery" },
            if sensors.power_saving { ", power saving" } else { "" }
        ),
        format!(
            "network: {}{}",
            network,
            if sensors.metered { ", metered" } else { "" }
        ),
        format!(
            "sync:    {}",
            if sensors.global_sync_enabled { "on" } else { "paused" }
        ),
    ];
    if decision.should_run() {
        lines.push("syncthing should run".to_string());
    } else {
        lines.push("syncthing should not run:".to_string());
        lines.push(format_reasons(decision.reasons()));
    }
    lines.join("\n")
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
