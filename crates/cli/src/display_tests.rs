// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use chrono::Duration;
use sg_core::{LifecycleState, Transport};
use yare::parameterized;

#[parameterized(
    seconds = { 42, "42s" },
    minutes = { 125, "2m" },
    hours = { 2 * 3600 + 5 * 60, "2h 5m" },
    days = { 3 * 86_400 + 4 * 3600 + 59, "3d 4h" },
)]
fn test_format_uptime(secs: u64, expected: &str) {
    assert_eq!(format_uptime(secs), expected);
}

#[test]
fn test_every_reason_has_text() {
    for reason in BlockReason::ALL {
        assert!(!reason_text(reason).is_empty());
        assert_ne!(reason_text(reason), reason.as_str());
    }
}

#[test]
fn test_status_lists_reasons_when_blocked() {
    let now = Utc::now();
    let mut status = SupervisorStatus::new(10, 3700, LifecycleState::Disabled, now - Duration::seconds(90));
    status.reasons = vec![BlockReason::OnBattery, BlockReason::WifiIsMetered];

    let text = format_status(&status, now, false);
    assert!(text.starts_with("syncthing: disabled (since 1m ago)"));
    assert!(text.contains("Not running because:\n  - running on battery"));
    assert!(text.contains("  - connected Wi-Fi is metered"));
    assert!(text.ends_with("supervisor: pid 10, up 1h 1m"));
}

#[test]
fn test_status_shows_daemon_pid_when_running() {
    let now = Utc::now();
    let mut status = SupervisorStatus::new(10, 5, LifecycleState::Active, now);
    status.should_run = true;
    status.daemon_pid = Some(2001);

    let text = format_status(&status, now, false);
    assert!(text.contains("syncthing: active"));
    assert!(text.contains("  pid 2001"));
    assert!(!text.contains("Not running"));
}

#[test]
fn test_status_since_in_future_is_clamped() {
    let now = Utc::now();
    let status = SupervisorStatus::new(1, 0, LifecycleState::Starting, now + Duration::seconds(30));
    assert!(format_status(&status, now, false).contains("(since 0s ago)"));
}

#[test]
fn test_decision_shows_sensors_and_reasons() {
    let sensors = SensorSnapshot {
        charging: false,
        power_saving: true,
        transport: Some(Transport::Wifi),
        metered: true,
        ssid: Some("cafe".to_string()),
        global_sync_enabled: true,
    };
    let decision = RunDecision::blocked(vec![BlockReason::PowerSavingEnabled]);

    let text = format_decision(&decision, &sensors);
    assert!(text.contains("power:   battery, power saving"));
    assert!(text.contains("network: wifi (cafe), metered"));
    assert!(text.contains("sync:    on"));
    assert!(text.ends_with("syncthing should not run:\n  - power saving is on"));
}

#[test]
fn test_decision_run_when_offline() {
    let text = format_decision(&RunDecision::RUN, &SensorSnapshot::default());
    assert!(text.contains("network: offline"));
    assert!(text.ends_with("syncthing should run"));
}
