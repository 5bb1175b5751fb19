// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Fakes shared by the controller, service and server tests.

#![allow(clippy::unwrap_used)]

use sg_core::LifecycleState;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::admin::{AdminApi, Endpoint, Pending, Subscription};
use crate::cancel::CancelToken;
use crate::controller::ControllerOptions;
use crate::error::{Error, Result};
use crate::notifier::Notifier;
use crate::process::{ExitCallback, ExitKind};
use crate::runtime::{DaemonRuntime, RunningDaemon, StartupPlan};

/// Ordered record of side effects across the fakes.
#[derive(Default)]
pub(crate) struct Journal(Mutex<Vec<String>>);

impl Journal {
    pub(crate) fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub(crate) fn position(&self, entry: &str) -> usize {
        let entries = self.entries();
        entries
            .iter()
            .position(|e| e == entry)
            .unwrap_or_else(|| unreachable!("{entry} missing from {entries:?}"))
    }
}

#[derive(Default)]
pub(crate) struct Gate {
    pub(crate) open: Mutex<bool>,
    pub(crate) cv: Condvar,
}

impl Gate {
    pub(crate) fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.cv.notify_all();
    }

    pub(crate) fn wait(&self, cancel: &CancelToken) -> Result<()> {
        let mut open = self.open.lock().unwrap();
        while !*open {
            cancel.check()?;
            open = self
                .cv
                .wait_timeout(open, Duration::from_millis(10))
                .unwrap()
                .0;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq)]
pub(crate) enum Outcome {
    Ready,
    ConfigUnreadable,
}

pub(crate) type SharedExit = Arc<Mutex<Option<ExitCallback>>>;

pub(crate) struct FakeRuntime {
    pub(crate) journal: Arc<Journal>,
    pub(crate) gate: Gate,
    pub(crate) outcome: Mutex<Outcome>,
    pub(crate) plans: Mutex<Vec<StartupPlan>>,
    pub(crate) launches: AtomicUsize,
    pub(crate) reachable: AtomicBool,
    pub(crate) last_exit: Mutex<Option<SharedExit>>,
}

impl FakeRuntime {
    pub(crate) fn new() -> Self {
        Self {
            journal: Arc::new(Journal::default()),
            gate: Gate::default(),
            outcome: Mutex::new(Outcome::Ready),
            plans: Mutex::new(Vec::new()),
            launches: AtomicUsize::new(0),
            reachable: AtomicBool::new(true),
            last_exit: Mutex::new(None),
        }
    }

    pub(crate) fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub(crate) fn plans(&self) -> Vec<StartupPlan> {
        self.plans.lock().unwrap().clone()
    }

    /// Make the running daemon exit on its own.
    pub(crate) fn exit(&self, kind: ExitKind) {
        let shared = self.last_exit.lock().unwrap().clone().unwrap();
        let callback = shared.lock().unwrap().take().unwrap();
        callback(kind);
    }
}

impl DaemonRuntime for FakeRuntime {
    fn prepare(&self, plan: StartupPlan, cancel: &CancelToken) -> Result<Option<Endpoint>> {
        self.plans.lock().unwrap().push(plan);
        self.gate.wait(cancel)?;
        match *self.outcome.lock().unwrap() {
            Outcome::ConfigUnreadable => Err(Error::ConfigUnreadable("truncated xml".into())),
            Outcome::Ready if plan.serve => Ok(Some(Endpoint {
                url: "http://127.0.0.1:8384".into(),
                api_key: "key".into(),
                device_id: None,
            })),
            Outcome::Ready => Ok(None),
        }
    }

    fn launch(&self, on_exit: ExitCallback) -> Result<Box<dyn RunningDaemon>> {
        let n = self.launches.fetch_add(1, Ordering::SeqCst) + 1;
        self.journal.push(format!("launched {n}"));
        let exit: SharedExit = Arc::new(Mutex::new(Some(on_exit)));
        *self.last_exit.lock().unwrap() = Some(Arc::clone(&exit));
        Ok(Box::new(FakeProcess {
            pid: 1000 + n as u32,
            exit,
            journal: Arc::clone(&self.journal),
        }))
    }

    fn probe(&self, _endpoint: &Endpoint) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }

    fn connect(&self, _endpoint: &Endpoint) -> Result<Arc<dyn AdminApi>> {
        Ok(Arc::new(FakeAdmin {
            journal: Arc::clone(&self.journal),
        }))
    }
}

pub(crate) struct FakeProcess {
    pub(crate) pid: u32,
    pub(crate) exit: SharedExit,
    pub(crate) journal: Arc<Journal>,
}

impl RunningDaemon for FakeProcess {
    fn pid(&self) -> Option<u32> {
        Some(self.pid)
    }

    fn kill(&mut self) {
        self.journal.push("killed");
        let callback = self.exit.lock().unwrap().take();
        if let Some(callback) = callback {
            callback(ExitKind::Normal);
        }
    }
}

pub(crate) struct FakeAdmin {
    pub(crate) journal: Arc<Journal>,
}

impl AdminApi for FakeAdmin {
    fn ignore_device(&self, device_id: &str, _name: &str, _address: &str) -> Pending<()> {
        self.journal.push(format!("ignore device {device_id}"));
        Pending::ready(Ok(()))
    }

    fn ignore_folder(&self, _device_id: &str, folder_id: &str, _label: &str) -> Pending<()> {
        self.journal.push(format!("ignore folder {folder_id}"));
        Pending::ready(Ok(()))
    }

    fn override_changes(&self, folder_id: &str) -> Pending<()> {
        self.journal.push(format!("override {folder_id}"));
        Pending::ready(Ok(()))
    }

    fn start_event_stream(&self) -> Result<Box<dyn Subscription>> {
        self.journal.push("events started");
        Ok(Box::new(FakeSubscription {
            journal: Arc::clone(&self.journal),
        }))
    }

    fn release(&self) {
        self.journal.push("released");
    }
}

pub(crate) struct FakeSubscription {
    pub(crate) journal: Arc<Journal>,
}

impl Subscription for FakeSubscription {
    fn stop(&mut self) {
        self.journal.push("events stopped");
    }
}

#[derive(Default)]
pub(crate) struct Recorder {
    pub(crate) crashed: Mutex<Vec<String>>,
    pub(crate) revoked: AtomicUsize,
    pub(crate) statuses: Mutex<Vec<LifecycleState>>,
}

impl Notifier for Recorder {
    fn show_crashed(&self, reason: &str) {
        self.crashed.lock().unwrap().push(reason.to_string());
    }
    fn show_restart_prompt(&self) {}
    fn update_persistent_status(&self, state: LifecycleState) {
        self.statuses.lock().unwrap().push(state);
    }
    fn show_permission_revoked(&self) {
        self.revoked.fetch_add(1, Ordering::SeqCst);
    }
    fn show_device_request(&self, _device_id: &str, _name: &str, _address: &str) {}
    fn show_folder_request(&self, _device_id: &str, _folder_id: &str, _label: &str) {}
}

pub(crate) fn wait_for(what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(5));
    }
}

/// Controller options with short intervals.
pub(crate) fn test_options() -> ControllerOptions {
    ControllerOptions {
        poll_interval: Duration::from_millis(5),
        probe_log_every: 50,
        deferred_stop_limit: Duration::from_secs(5),
        poller_join_timeout: Duration::from_millis(100),
    }
}
