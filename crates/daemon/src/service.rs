// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Service facade.
//!
//! Wires the run-condition monitor to the lifecycle controller and exposes
//! the operations the IPC server and signal handlers drive.

use sg_core::{ConditionSensors, LifecycleState, RunDecision};
use sg_ipc::SupervisorStatus;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::admin::Pending;
use crate::controller::{Controller, ControllerOptions};
use crate::error::Result;
use crate::listeners::{Listener, ListenerId};
use crate::monitor::{Delivery, RunConditionMonitor};
use crate::notifier::Notifier;
use crate::runtime::DaemonRuntime;
use crate::settings::ConditionSource;
use crate::signals::{PollingSource, SignalSource};

pub struct Service {
    monitor: RunConditionMonitor,
    controller: Arc<Controller>,
    storage: Mutex<Option<Box<dyn SignalSource>>>,
    started: Instant,
}

impl Service {
    /// Start the controller, then the monitor feeding it.
    pub fn start(
        conditions: Arc<dyn ConditionSource>,
        sensors: Arc<dyn ConditionSensors>,
        runtime: Arc<dyn DaemonRuntime>,
        notifier: Arc<dyn Notifier>,
        options: ControllerOptions,
    ) -> Result<Self> {
        let controller = Arc::new(Controller::spawn(runtime, notifier, options)?);
        let monitor =
            RunConditionMonitor::new(conditions, sensors, Box::new(controller.decision_sink()));
        Ok(Self {
            monitor,
            controller,
            storage: Mutex::new(None),
            started: Instant::now(),
        })
    }

    /// Add a signal source to the monitor.
    pub fn subscribe(&self, source: Box<dyn SignalSource>, delivery: Delivery) -> Result<()> {
        self.monitor.subscribe(source, delivery)
    }

    /// Poll write access to `home`; losing it stops the daemon.
    pub fn watch_storage(&self, home: PathBuf, interval: Duration) -> Result<()> {
        let sampled = home.clone();
        let mut source = PollingSource::new("storage", interval, move || {
            storage_writable(&sampled)
        });
        let controller = Arc::clone(&self.controller);
        let check = move || {
            if storage_writable(&home) {
                controller.permission_restored();
            } else {
                controller.permission_revoked();
            }
        };
        check();
        source.subscribe(Arc::new(check))?;
        if let Ok(mut storage) = self.storage.lock() {
            *storage = Some(Box::new(source));
        }
        Ok(())
    }

    pub fn register_state_listener(&self, listener: Listener<LifecycleState>) -> ListenerId {
        self.controller.register_state_listener(listener)
    }

    pub fn unregister_state_listener(&self, id: ListenerId) -> bool {
        self.controller.unregister_state_listener(id)
    }

    pub fn register_run_condition_listener(&self, listener: Listener<RunDecision>) -> ListenerId {
        self.controller.register_decision_listener(listener)
    }

    pub fn unregister_run_condition_listener(&self, id: ListenerId) -> bool {
        self.controller.unregister_decision_listener(id)
    }

    pub fn restart(&self) -> Result<()> {
        self.controller.restart()
    }

    pub fn reset_database(&self) -> Result<()> {
        self.controller.reset_database()
    }

    pub fn reset_deltas(&self) -> Result<()> {
        self.controller.reset_deltas()
    }

    /// Re-read every signal and apply the result even if unchanged.
    pub fn refresh_network_info(&self) {
        self.monitor.force_reevaluate();
        self.controller.reapply_decision();
    }

    pub fn ignore_device(&self, device_id: &str, name: &str, address: &str) -> Result<Pending<()>> {
        self.controller.ignore_device(device_id, name, address)
    }

    pub fn ignore_folder(&self, device_id: &str, folder_id: &str, label: &str) -> Result<Pending<()>> {
        self.controller.ignore_folder(device_id, folder_id, label)
    }

    pub fn override_changes(&self, folder_id: &str) -> Result<Pending<()>> {
        self.controller.override_changes(folder_id)
    }

    pub fn permission_revoked(&self) {
        self.controller.permission_revoked();
    }

    pub fn permission_restored(&self) {
        self.controller.permission_restored();
    }

    pub fn state(&self) -> LifecycleState {
        self.controller.state()
    }

    /// Last decision taken by the monitor.
    pub fn decision(&self) -> Option<RunDecision> {
        self.monitor.current()
    }

    pub fn status(&self) -> SupervisorStatus {
        let current = self.controller.status();
        let mut status = SupervisorStatus::new(
            std::process::id(),
            self.started.elapsed().as_secs(),
            current.state,
            current.since,
        );
        if let Some(decision) = current.decision.or_else(|| self.monitor.current()) {
            status.should_run = decision.should_run();
            status.reasons = decision.reasons().to_vec();
        }
        status.daemon_pid = current.daemon_pid;
        status
    }

    /// Stop watching signals, then stop the daemon. Idempotent.
    pub fn shutdown(&self) {
        self.monitor.shutdown();
        let storage = self.storage.lock().ok().and_then(|mut s| s.take());
        if let Some(mut storage) = storage {
            storage.unsubscribe();
        }
        self.controller.shutdown();
    }
}

impl Drop for Service {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// True when the nearest existing ancestor of `path` is writable.
pub fn storage_writable(path: &Path) -> bool {
    let mut current = Some(path);
    while let Some(dir) = current {
        if dir.exists() {
            return writable(dir);
        }
        current = dir.parent();
    }
    false
}

#[cfg(unix)]
fn writable(path: &Path) -> bool {
    nix::unistd::access(path, nix::unistd::AccessFlags::W_OK).is_ok()
}

#[cfg(not(unix))]
fn writable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| !m.permissions().readonly())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
