// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! User-facing notifications.

use sg_core::LifecycleState;

/// Surfaces supervisor events to the user.
pub trait Notifier: Send + Sync {
    /// The daemon crashed or could not be started.
    fn show_crashed(&self, reason: &str);

    /// A configuration change takes effect only after a restart.
    fn show_restart_prompt(&self);

    /// Persistent status line, refreshed on every state transition.
    fn update_persistent_status(&self, state: LifecycleState);

    /// Access to the daemon's storage was lost.
    fn show_permission_revoked(&self);

    /// An unknown device asked to connect.
    fn show_device_request(&self, device_id: &str, name: &str, address: &str);

    /// A known device offered a folder that is not shared yet.
    fn show_folder_request(&self, device_id: &str, folder_id: &str, label: &str);
}

/// Writes notifications to the supervisor log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show_crashed(&self, reason: &str) {
        tracing::error!(target: "notify", "sync daemon crashed: {}", reason);
    }

    fn show_restart_prompt(&self) {
        tracing::warn!(
            target: "notify",
            "configuration changed; run `syncguard restart` to apply"
        );
    }

    fn update_persistent_status(&self, state: LifecycleState) {
        tracing::info!(target: "notify", "status: {}", state);
    }

    fn show_permission_revoked(&self) {
        tracing::error!(
            target: "notify",
            "storage permission revoked; sync daemon stopped"
        );
    }

    fn show_device_request(&self, device_id: &str, name: &str, address: &str) {
        tracing::warn!(
            target: "notify",
            "device {} ({}) at {} wants to connect; accept it in the web UI or run `syncguard ignore-device {}`",
            name,
            device_id,
            address,
            device_id
        );
    }

    fn show_folder_request(&self, device_id: &str, folder_id: &str, label: &str) {
        tracing::warn!(
            target: "notify",
            "device {} shares folder \"{}\" ({}); accept it in the web UI or run `syncguard ignore-folder {} {}`",
            device_id,
            label,
            folder_id,
            device_id,
            folder_id
        );
    }
}
