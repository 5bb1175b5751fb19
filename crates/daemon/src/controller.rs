// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle controller for the sync daemon.
//!
//! One thread owns the state machine and consumes a command channel;
//! every transition and every listener callback runs there, so callers on
//! any thread only ever enqueue. Background work (startup preparation,
//! readiness polling, the daemon's wrapper thread) reports back through
//! the same channel, tagged with the generation it was started for;
//! results from a superseded generation are dropped.
//!
//! ```text
//! Disabled/Init ──run──▶ Starting ──prepared──▶ (daemon launched, polling)
//!                            │                         │ reachable
//!                            │ config unreadable       ▼
//!                            └────────▶ Error        Active
//! ```
//!
//! A stop requested while `Starting` is deferred until startup reaches a
//! terminal point: the API became available, the daemon exited, or
//! preparation failed.

use chrono::{DateTime, Utc};
use sg_core::{LifecycleState, RunDecision};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::admin::{AdminApi, Endpoint, Pending, Subscription};
use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::listeners::{Listener, ListenerId, Listeners};
use crate::notifier::Notifier;
use crate::process::{DaemonCommand, ExitKind};
use crate::runtime::{DaemonRuntime, RunningDaemon, StartupPlan};

/// Tuning knobs for the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Delay between readiness probes.
    pub poll_interval: Duration,
    /// Log every n-th failed probe after the first.
    pub probe_log_every: u32,
    /// Give up waiting for startup to settle before a deferred stop.
    pub deferred_stop_limit: Duration,
    /// How long to wait for a cancelled poller before detaching it.
    pub poller_join_timeout: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            probe_log_every: 50,
            deferred_stop_limit: Duration::from_secs(30),
            poller_join_timeout: Duration::from_millis(500),
        }
    }
}

/// Snapshot of the controller, readable from any thread.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerStatus {
    pub state: LifecycleState,
    pub since: DateTime<Utc>,
    pub daemon_pid: Option<u32>,
    pub decision: Option<RunDecision>,
}

type Reply<T> = Sender<Result<T>>;

enum Command {
    Decision(RunDecision),
    Reapply,
    Restart(Reply<()>),
    Reset(DaemonCommand, Reply<()>),
    IgnoreDevice {
        device_id: String,
        name: String,
        address: String,
        reply: Reply<Pending<()>>,
    },
    IgnoreFolder {
        device_id: String,
        folder_id: String,
        label: String,
        reply: Reply<Pending<()>>,
    },
    OverrideChanges {
        folder_id: String,
        reply: Reply<Pending<()>>,
    },
    PermissionRevoked,
    PermissionRestored,
    WatchState(ListenerId, Listener<LifecycleState>),
    WatchDecision(ListenerId, Listener<RunDecision>),
    Shutdown(Sender<()>),
    Prepared {
        generation: u64,
        result: Result<Option<Endpoint>>,
    },
    ApiAvailable {
        generation: u64,
        admin: Arc<dyn AdminApi>,
    },
    Exited {
        generation: u64,
        kind: ExitKind,
    },
}

/// Handle to the controller thread.
pub struct Controller {
    tx: Sender<Command>,
    status: Arc<Mutex<ControllerStatus>>,
    state_listeners: Arc<Listeners<LifecycleState>>,
    decision_listeners: Arc<Listeners<RunDecision>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Controller {
    pub fn spawn(
        runtime: Arc<dyn DaemonRuntime>,
        notifier: Arc<dyn Notifier>,
        options: ControllerOptions,
    ) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let status = Arc::new(Mutex::new(ControllerStatus {
            state: LifecycleState::Disabled,
            since: Utc::now(),
            daemon_pid: None,
            decision: None,
        }));
        let state_listeners = Arc::new(Listeners::new("state"));
        let decision_listeners = Arc::new(Listeners::new("run-condition"));

        let machine = Machine {
            runtime,
            notifier,
            options,
            tx: tx.clone(),
            status: Arc::clone(&status),
            state_listeners: Arc::clone(&state_listeners),
            decision_listeners: Arc::clone(&decision_listeners),
            state: LifecycleState::Disabled,
            generation: 0,
            last_should_run: None,
            decision: None,
            startup: None,
            process: None,
            poller: None,
            events: None,
            admin: None,
            pending_stop: None,
            permission_revoked: false,
            config_error_notified: false,
        };
        let handle = thread::Builder::new()
            .name("controller".to_string())
            .spawn(move || machine.run(rx))?;

        Ok(Self {
            tx,
            status,
            state_listeners,
            decision_listeners,
            thread: Mutex::new(Some(handle)),
        })
    }

    fn send(&self, command: Command) {
        if self.tx.send(command).is_err() {
            tracing::debug!("controller stopped, dropping command");
        }
    }

    fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (reply, rx) = mpsc::channel();
        self.tx
            .send(make(reply))
            .map_err(|_| Error::ControllerStopped)?;
        rx.recv().map_err(|_| Error::ControllerStopped)?
    }

    /// Feed a run decision from the monitor.
    pub fn submit_decision(&self, decision: RunDecision) {
        self.send(Command::Decision(decision));
    }

    /// A callback forwarding decisions to this controller.
    pub fn decision_sink(&self) -> impl Fn(&RunDecision) + Send + Sync + 'static {
        let tx = self.tx.clone();
        move |decision: &RunDecision| {
            let _ = tx.send(Command::Decision(decision.clone()));
        }
    }

    /// Forget the last applied decision and apply the current one again.
    pub fn reapply_decision(&self) {
        self.send(Command::Reapply);
    }

    pub fn state(&self) -> LifecycleState {
        self.status().state
    }

    pub fn status(&self) -> ControllerStatus {
        match self.status.lock() {
            Ok(status) => status.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Invoked with the current state, then on every transition.
    pub fn register_state_listener(&self, listener: Listener<LifecycleState>) -> ListenerId {
        let id = self.state_listeners.allocate_id();
        self.send(Command::WatchState(id, listener));
        id
    }

    pub fn unregister_state_listener(&self, id: ListenerId) -> bool {
        self.state_listeners.remove(id)
    }

    /// Invoked with the current decision, then on every change.
    pub fn register_decision_listener(&self, listener: Listener<RunDecision>) -> ListenerId {
        let id = self.decision_listeners.allocate_id();
        self.send(Command::WatchDecision(id, listener));
        id
    }

    pub fn unregister_decision_listener(&self, id: ListenerId) -> bool {
        self.decision_listeners.remove(id)
    }

    pub fn restart(&self) -> Result<()> {
        self.request(Command::Restart)
    }

    pub fn reset_database(&self) -> Result<()> {
        self.request(|reply| Command::Reset(DaemonCommand::ResetDatabase, reply))
    }

    pub fn reset_deltas(&self) -> Result<()> {
        self.request(|reply| Command::Reset(DaemonCommand::ResetDeltas, reply))
    }

    pub fn ignore_device(&self, device_id: &str, name: &str, address: &str) -> Result<Pending<()>> {
        self.request(|reply| Command::IgnoreDevice {
            device_id: device_id.to_string(),
            name: name.to_string(),
            address: address.to_string(),
            reply,
        })
    }

    pub fn ignore_folder(&self, device_id: &str, folder_id: &str, label: &str) -> Result<Pending<()>> {
        self.request(|reply| Command::IgnoreFolder {
            device_id: device_id.to_string(),
            folder_id: folder_id.to_string(),
            label: label.to_string(),
            reply,
        })
    }

    pub fn override_changes(&self, folder_id: &str) -> Result<Pending<()>> {
        self.request(|reply| Command::OverrideChanges {
            folder_id: folder_id.to_string(),
            reply,
        })
    }

    /// Storage became inaccessible: stop at once and refuse to start.
    pub fn permission_revoked(&self) {
        self.send(Command::PermissionRevoked);
    }

    pub fn permission_restored(&self) {
        self.send(Command::PermissionRestored);
    }

    /// Stop the daemon and the controller thread. Idempotent.
    pub fn shutdown(&self) {
        let handle = match self.thread.lock() {
            Ok(mut thread) => thread.take(),
            Err(_) => None,
        };
        let Some(handle) = handle else {
            return;
        };
        let (done, rx) = mpsc::channel();
        if self.tx.send(Command::Shutdown(done)).is_ok() {
            let _ = rx.recv();
        }
        if handle.join().is_err() {
            tracing::error!("controller thread panicked");
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// What to do once a shutdown sequence has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Then {
    Nothing,
    Launch(StartupPlan),
}

struct PendingStop {
    target: LifecycleState,
    then: Then,
    exit: Option<Sender<()>>,
    deadline: Instant,
}

struct Worker {
    cancel: CancelToken,
    handle: JoinHandle<()>,
}

struct Machine {
    runtime: Arc<dyn DaemonRuntime>,
    notifier: Arc<dyn Notifier>,
    options: ControllerOptions,
    tx: Sender<Command>,
    status: Arc<Mutex<ControllerStatus>>,
    state_listeners: Arc<Listeners<LifecycleState>>,
    decision_listeners: Arc<Listeners<RunDecision>>,

    state: LifecycleState,
    generation: u64,
    last_should_run: Option<bool>,
    decision: Option<RunDecision>,
    startup: Option<Worker>,
    process: Option<Box<dyn RunningDaemon>>,
    poller: Option<Worker>,
    events: Option<Box<dyn Subscription>>,
    admin: Option<Arc<dyn AdminApi>>,
    pending_stop: Option<PendingStop>,
    permission_revoked: bool,
    config_error_notified: bool,
}

impl Machine {
    fn run(mut self, rx: Receiver<Command>) {
        loop {
            let command = match self.pending_stop.as_ref().map(|p| p.deadline) {
                Some(deadline) => {
                    let wait = deadline.saturating_duration_since(Instant::now());
                    match rx.recv_timeout(wait) {
                        Ok(command) => command,
                        Err(RecvTimeoutError::Timeout) => {
                            tracing::warn!("startup did not settle, stopping anyway");
                            if self.run_pending_stop() == Flow::Exit {
                                break;
                            }
                            continue;
                        }
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                None => match rx.recv() {
                    Ok(command) => command,
                    Err(_) => break,
                },
            };
            if self.handle(command) == Flow::Exit {
                break;
            }
        }
        tracing::debug!("controller stopped");
    }

    fn handle(&mut self, command: Command) -> Flow {
        match command {
            Command::Decision(decision) => {
                self.decision = Some(decision.clone());
                self.publish();
                self.decision_listeners.deliver(&decision);
                self.apply_should_run(decision.should_run());
            }
            Command::Reapply => self.reapply(),
            Command::Restart(reply) => {
                let result = self.require_active("restart");
                let _ = reply.send(result.map(|_| ()));
                if self.state == LifecycleState::Active {
                    tracing::info!("restarting daemon");
                    return self.request_stop(LifecycleState::Init, Then::Launch(StartupPlan::SERVE), None);
                }
            }
            Command::Reset(command, reply) => {
                if self.state == LifecycleState::Error {
                    let _ = reply.send(Err(Error::Unrecoverable {
                        action: command.as_str(),
                        actual: self.state,
                    }));
                    return Flow::Continue;
                }
                if self.permission_revoked {
                    let _ = reply.send(Err(Error::StorageRevoked {
                        action: command.as_str(),
                    }));
                    return Flow::Continue;
                }
                let serve = self.decision.as_ref().is_some_and(RunDecision::should_run);
                let _ = reply.send(Ok(()));
                tracing::info!("{} requested", command.as_str());
                return self.request_stop(
                    LifecycleState::Init,
                    Then::Launch(StartupPlan::reset(command, serve)),
                    None,
                );
            }
            Command::IgnoreDevice {
                device_id,
                name,
                address,
                reply,
            } => {
                let result = self
                    .require_active("ignore a device")
                    .map(|admin| admin.ignore_device(&device_id, &name, &address));
                let _ = reply.send(result);
            }
            Command::IgnoreFolder {
                device_id,
                folder_id,
                label,
                reply,
            } => {
                let result = self
                    .require_active("ignore a folder")
                    .map(|admin| admin.ignore_folder(&device_id, &folder_id, &label));
                let _ = reply.send(result);
            }
            Command::OverrideChanges { folder_id, reply } => {
                let result = self
                    .require_active("override changes")
                    .map(|admin| admin.override_changes(&folder_id));
                let _ = reply.send(result);
            }
            Command::PermissionRevoked => return self.on_permission_revoked(),
            Command::PermissionRestored => {
                if self.permission_revoked {
                    tracing::info!("storage permission restored");
                    self.permission_revoked = false;
                    self.reapply();
                }
            }
            Command::WatchState(id, listener) => {
                if self.state_listeners.insert(id, listener) {
                    self.state_listeners.deliver_to(id, &self.state);
                }
            }
            Command::WatchDecision(id, listener) => {
                if !self.decision_listeners.insert(id, listener) {
                    return Flow::Continue;
                }
                if let Some(decision) = &self.decision {
                    self.decision_listeners.deliver_to(id, decision);
                }
            }
            Command::Shutdown(done) => {
                tracing::info!("controller shutdown requested");
                return self.request_stop(LifecycleState::Disabled, Then::Nothing, Some(done));
            }
            Command::Prepared { generation, result } => {
                if self.is_stale(generation) {
                    tracing::debug!("ignoring stale startup result");
                    return Flow::Continue;
                }
                return self.on_prepared(result);
            }
            Command::ApiAvailable { generation, admin } => {
                if self.is_stale(generation) {
                    tracing::debug!("ignoring stale readiness");
                    admin.release();
                    return Flow::Continue;
                }
                return self.on_api_available(admin);
            }
            Command::Exited { generation, kind } => {
                if generation != self.generation || self.process.is_none() {
                    tracing::debug!("ignoring exit of a retired daemon");
                    return Flow::Continue;
                }
                return self.on_exit(kind);
            }
        }
        Flow::Continue
    }

    fn is_stale(&self, generation: u64) -> bool {
        generation != self.generation || self.state != LifecycleState::Starting
    }

    fn require_active(&self, action: &'static str) -> Result<Arc<dyn AdminApi>> {
        match (&self.admin, self.state) {
            (Some(admin), LifecycleState::Active) => Ok(Arc::clone(admin)),
            _ => Err(Error::NotActive {
                action,
                actual: self.state,
            }),
        }
    }

    fn reapply(&mut self) {
        self.last_should_run = None;
        if let Some(decision) = self.decision.clone() {
            self.apply_should_run(decision.should_run());
        }
    }

    fn apply_should_run(&mut self, run: bool) {
        if self.last_should_run == Some(run) {
            return;
        }
        self.last_should_run = Some(run);
        if run {
            let plain_stop = self.pending_stop.as_ref().is_some_and(|p| {
                p.exit.is_none() && p.target == LifecycleState::Disabled && p.then == Then::Nothing
            });
            if plain_stop {
                tracing::info!("run conditions met again, dropping deferred stop");
                self.pending_stop = None;
            }
            self.launch(StartupPlan::SERVE);
        } else {
            self.request_stop(LifecycleState::Disabled, Then::Nothing, None);
        }
    }

    fn launch(&mut self, plan: StartupPlan) {
        if self.permission_revoked {
            tracing::warn!("storage permission revoked, not starting daemon");
            return;
        }
        if !self.state.can_launch() {
            tracing::debug!("not launching while {}", self.state);
            return;
        }
        if self.startup.as_ref().is_some_and(|w| !w.handle.is_finished()) {
            tracing::warn!("startup already in progress, ignoring launch");
            return;
        }
        if let Some(mut stray) = self.process.take() {
            tracing::warn!("tearing down stray daemon before launch");
            stray.kill();
        }
        self.join_startup();

        self.generation += 1;
        let generation = self.generation;
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let runtime = Arc::clone(&self.runtime);
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name("startup".to_string())
            .spawn(move || {
                let result = runtime.prepare(plan, &token);
                let _ = tx.send(Command::Prepared { generation, result });
            });
        match spawned {
            Ok(handle) => {
                self.startup = Some(Worker { cancel, handle });
                self.set_state(LifecycleState::Starting);
            }
            Err(e) => {
                tracing::error!("failed to start startup task: {}", e);
                self.notifier.show_crashed(&e.to_string());
            }
        }
    }

    fn on_prepared(&mut self, result: Result<Option<Endpoint>>) -> Flow {
        match result {
            Ok(Some(endpoint)) => {
                let generation = self.generation;
                let tx = self.tx.clone();
                let on_exit = Box::new(move |kind: ExitKind| {
                    let _ = tx.send(Command::Exited { generation, kind });
                });
                match self.runtime.launch(on_exit) {
                    Ok(process) => {
                        self.process = Some(process);
                        self.publish();
                        self.start_poller(endpoint);
                        Flow::Continue
                    }
                    Err(e) => self.fail(e),
                }
            }
            Ok(None) => {
                if self.pending_stop.is_some() {
                    return self.run_pending_stop();
                }
                self.teardown(LifecycleState::Disabled, Then::Nothing);
                Flow::Continue
            }
            Err(Error::Cancelled) => Flow::Continue,
            Err(e @ (Error::ConfigUnreadable(_) | Error::Launch { .. })) => self.fail(e),
            Err(e) => {
                tracing::error!("daemon startup failed: {}", e);
                self.notifier.show_crashed(&e.to_string());
                self.last_should_run = None;
                let exit = self.pending_stop.take().and_then(|p| p.exit);
                self.teardown(LifecycleState::Disabled, Then::Nothing);
                Self::finish(exit)
            }
        }
    }

    /// Unrecoverable startup failure.
    fn fail(&mut self, error: Error) -> Flow {
        tracing::error!("daemon cannot start: {}", error);
        if !self.config_error_notified {
            self.config_error_notified = true;
            self.notifier.show_crashed(&error.to_string());
        }
        let exit = self.pending_stop.take().and_then(|p| p.exit);
        self.teardown(LifecycleState::Error, Then::Nothing);
        Self::finish(exit)
    }

    fn finish(exit: Option<Sender<()>>) -> Flow {
        match exit {
            Some(done) => {
                let _ = done.send(());
                Flow::Exit
            }
            None => Flow::Continue,
        }
    }

    fn start_poller(&mut self, endpoint: Endpoint) {
        let generation = self.generation;
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let runtime = Arc::clone(&self.runtime);
        let tx = self.tx.clone();
        let interval = self.options.poll_interval;
        let log_every = self.options.probe_log_every.max(1);
        let spawned = thread::Builder::new()
            .name("readiness".to_string())
            .spawn(move || {
                let mut failures: u32 = 0;
                loop {
                    if runtime.probe(&endpoint) {
                        match runtime.connect(&endpoint) {
                            Ok(admin) => {
                                tracing::info!("daemon API available at {}", endpoint.url);
                                let _ = tx.send(Command::ApiAvailable { generation, admin });
                                return;
                            }
                            Err(e) => {
                                failures += 1;
                                if failures == 1 || failures % log_every == 0 {
                                    tracing::warn!("admin client not ready: {}", e);
                                }
                            }
                        }
                    } else {
                        failures += 1;
                        if failures == 1 || failures % log_every == 0 {
                            tracing::info!(
                                "daemon API not reachable yet ({} attempts)",
                                failures
                            );
                        }
                    }
                    if token.sleep(interval) {
                        return;
                    }
                }
            });
        match spawned {
            Ok(handle) => self.poller = Some(Worker { cancel, handle }),
            Err(e) => tracing::error!("failed to start readiness poller: {}", e),
        }
    }

    fn on_api_available(&mut self, admin: Arc<dyn AdminApi>) -> Flow {
        if let Some(poller) = self.poller.take() {
            let _ = poller.handle.join();
        }
        self.admin = Some(Arc::clone(&admin));
        self.set_state(LifecycleState::Active);
        match admin.start_event_stream() {
            Ok(stream) => self.events = Some(stream),
            Err(e) => tracing::warn!("failed to start event stream: {}", e),
        }
        if self.pending_stop.is_some() {
            return self.run_pending_stop();
        }
        Flow::Continue
    }

    fn on_exit(&mut self, kind: ExitKind) -> Flow {
        if self.pending_stop.is_some() {
            return self.run_pending_stop();
        }
        match kind {
            ExitKind::Normal => {
                tracing::info!("daemon exited on its own");
                self.last_should_run = None;
                self.teardown(LifecycleState::Disabled, Then::Nothing);
            }
            ExitKind::RestartRequested => {
                tracing::info!("daemon asked to be restarted");
                self.teardown(LifecycleState::Init, Then::Launch(StartupPlan::SERVE));
            }
            ExitKind::Crashed(code) => {
                tracing::error!("daemon crashed with exit code {}", code);
                self.notifier
                    .show_crashed(&format!("daemon exited with code {code}"));
                self.last_should_run = None;
                self.teardown(LifecycleState::Disabled, Then::Nothing);
            }
        }
        Flow::Continue
    }

    fn on_permission_revoked(&mut self) -> Flow {
        if self.permission_revoked {
            return Flow::Continue;
        }
        tracing::error!("storage permission revoked, stopping daemon");
        self.permission_revoked = true;
        self.notifier.show_permission_revoked();
        let exit = self.pending_stop.take().and_then(|p| p.exit);
        self.teardown(LifecycleState::Disabled, Then::Nothing);
        Self::finish(exit)
    }

    /// Stop now, or defer while startup is in flight.
    fn request_stop(
        &mut self,
        target: LifecycleState,
        then: Then,
        exit: Option<Sender<()>>,
    ) -> Flow {
        if self.state != LifecycleState::Starting {
            return self.run_stop(target, then, exit);
        }
        tracing::info!("startup in progress, deferring stop");
        match &mut self.pending_stop {
            Some(pending) => {
                if exit.is_some() {
                    pending.exit = exit;
                }
                if pending.exit.is_some() {
                    pending.target = LifecycleState::Disabled;
                    pending.then = Then::Nothing;
                } else {
                    pending.target = target;
                    pending.then = then;
                }
            }
            None => {
                self.pending_stop = Some(PendingStop {
                    target,
                    then,
                    exit,
                    deadline: Instant::now() + self.options.deferred_stop_limit,
                });
            }
        }
        Flow::Continue
    }

    fn run_pending_stop(&mut self) -> Flow {
        match self.pending_stop.take() {
            Some(p) => self.run_stop(p.target, p.then, p.exit),
            None => Flow::Continue,
        }
    }

    fn run_stop(&mut self, target: LifecycleState, then: Then, exit: Option<Sender<()>>) -> Flow {
        if exit.is_some() {
            self.teardown(target, Then::Nothing);
            return Self::finish(exit);
        }
        let target = if self.state == LifecycleState::Error && target == LifecycleState::Disabled {
            LifecycleState::Error
        } else {
            target
        };
        self.teardown(target, then);
        Flow::Continue
    }

    /// The shutdown sequence, in order.
    fn teardown(&mut self, target: LifecycleState, then: Then) {
        self.set_state(target);

        if let Some(poller) = self.poller.take() {
            poller.cancel.cancel();
            join_bounded(poller.handle, self.options.poller_join_timeout, "readiness poller");
        }
        if let Some(mut events) = self.events.take() {
            events.stop();
        }
        if let Some(admin) = self.admin.take() {
            admin.release();
        }
        if let Some(mut process) = self.process.take() {
            process.kill();
            self.publish();
        }
        self.join_startup();
        self.generation += 1;

        if let Then::Launch(plan) = then {
            self.launch(plan);
        }
    }

    fn join_startup(&mut self) {
        if let Some(startup) = self.startup.take() {
            startup.cancel.cancel();
            if startup.handle.join().is_err() {
                tracing::warn!("startup task panicked");
            }
        }
    }

    fn set_state(&mut self, state: LifecycleState) {
        if self.state == state {
            return;
        }
        tracing::info!("daemon state {} -> {}", self.state, state);
        self.state = state;
        if let Ok(mut status) = self.status.lock() {
            status.since = Utc::now();
        }
        self.publish();
        self.notifier.update_persistent_status(state);
        self.state_listeners.deliver(&state);
    }

    fn publish(&self) {
        if let Ok(mut status) = self.status.lock() {
            status.state = self.state;
            status.daemon_pid = self.process.as_ref().and_then(|p| p.pid());
            status.decision = self.decision.clone();
        }
    }
}

fn join_bounded(handle: JoinHandle<()>, timeout: Duration, what: &str) {
    let deadline = Instant::now() + timeout;
    while !handle.is_finished() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    if handle.is_finished() {
        if handle.join().is_err() {
            tracing::warn!("{} panicked", what);
        }
    } else {
        tracing::debug!("{} still busy, detaching", what);
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
