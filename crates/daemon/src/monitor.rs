// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Run-condition monitor.
//!
//! Signal sources call back into the monitor whenever something relevant
//! may have changed. Every call re-reads preferences and sensors, evaluates,
//! and notifies the listener only when the decision differs from the last
//! one. Comparison, store and notification all happen under one lock, so
//! notifications are never interleaved or reordered.

use sg_core::{evaluate, ConditionSensors, RunDecision};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::cancel::CancelToken;
use crate::error::Result;
use crate::listeners::invoke_guarded;
use crate::settings::ConditionSource;
use crate::signals::{SignalSource, Trigger};

/// Receives each changed decision.
pub type DecisionListener = Box<dyn Fn(&RunDecision) + Send + Sync>;

/// How a source's notifications reach the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Immediate,
    /// Trailing-edge debounce: bursts collapse into one evaluation once the
    /// source has been quiet for the given duration.
    Debounced(Duration),
}

pub struct RunConditionMonitor {
    core: Arc<MonitorCore>,
    sources: Mutex<Vec<Box<dyn SignalSource>>>,
}

struct MonitorCore {
    conditions: Arc<dyn ConditionSource>,
    sensors: Arc<dyn ConditionSensors>,
    listener: DecisionListener,
    last: Mutex<Option<RunDecision>>,
    stopped: AtomicBool,
    debounce: Mutex<DebounceState>,
    debounce_cancel: CancelToken,
}

#[derive(Default)]
struct DebounceState {
    deadline: Option<Instant>,
    running: bool,
}

impl RunConditionMonitor {
    /// Create the monitor and evaluate once, synchronously.
    pub fn new(
        conditions: Arc<dyn ConditionSource>,
        sensors: Arc<dyn ConditionSensors>,
        listener: DecisionListener,
    ) -> Self {
        let core = Arc::new(MonitorCore {
            conditions,
            sensors,
            listener,
            last: Mutex::new(None),
            stopped: AtomicBool::new(false),
            debounce: Mutex::new(DebounceState::default()),
            debounce_cancel: CancelToken::new(),
        });
        core.on_signal();
        Self {
            core,
            sources: Mutex::new(Vec::new()),
        }
    }

    /// Subscribe to a signal source; the monitor owns it from now on.
    pub fn subscribe(&self, mut source: Box<dyn SignalSource>, delivery: Delivery) -> Result<()> {
        let core = Arc::clone(&self.core);
        let trigger: Trigger = match delivery {
            Delivery::Immediate => Arc::new(move || core.on_signal()),
            Delivery::Debounced(delay) => Arc::new(move || MonitorCore::schedule(&core, delay)),
        };
        source.subscribe(trigger)?;
        tracing::debug!("subscribed to {} ({:?})", source.name(), delivery);
        if let Ok(mut sources) = self.sources.lock() {
            sources.push(source);
        }
        Ok(())
    }

    /// Evaluate now, bypassing any debounce.
    pub fn force_reevaluate(&self) {
        self.core.on_signal();
    }

    /// The last decision delivered to the listener.
    pub fn current(&self) -> Option<RunDecision> {
        self.core.last.lock().ok().and_then(|l| l.clone())
    }

    /// Unsubscribe every source and cancel pending evaluations. Idempotent.
    pub fn shutdown(&self) {
        if self.core.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.core.debounce_cancel.cancel();
        let sources: Vec<Box<dyn SignalSource>> = match self.sources.lock() {
            Ok(mut sources) => sources.drain(..).collect(),
            Err(_) => Vec::new(),
        };
        for mut source in sources {
            source.unsubscribe();
        }
        tracing::debug!("run-condition monitor stopped");
    }
}

impl Drop for RunConditionMonitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl MonitorCore {
    fn on_signal(&self) {
        if self.stopped.load(Ordering::SeqCst) {
            return;
        }
        let Ok(mut last) = self.last.lock() else {
            return;
        };
        let decision = evaluate(&self.conditions.run_conditions(), &self.sensors.snapshot());
        if last.as_ref() == Some(&decision) {
            return;
        }
        tracing::info!("run decision: {}", decision);
        *last = Some(decision.clone());
        invoke_guarded("run-condition", 0, || (self.listener)(&decision));
    }

    fn schedule(core: &Arc<MonitorCore>, delay: Duration) {
        if core.stopped.load(Ordering::SeqCst) {
            return;
        }
        {
            let Ok(mut state) = core.debounce.lock() else {
                return;
            };
            state.deadline = Some(Instant::now() + delay);
            if state.running {
                return;
            }
            state.running = true;
        }
        let worker = Arc::clone(core);
        let spawned = thread::Builder::new()
            .name("debounce".to_string())
            .spawn(move || worker.run_debounce());
        if let Err(e) = spawned {
            tracing::warn!("failed to start debounce timer, evaluating now: {}", e);
            if let Ok(mut state) = core.debounce.lock() {
                state.running = false;
                state.deadline = None;
            }
            core.on_signal();
        }
    }

    fn run_debounce(&self) {
        loop {
            let wait = {
                let Ok(mut state) = self.debounce.lock() else {
                    return;
                };
                let now = Instant::now();
                match state.deadline {
                    Some(deadline) if deadline > now => deadline - now,
                    _ => {
                        state.deadline = None;
                        state.running = false;
                        break;
                    }
                }
            };
            if self.debounce_cancel.sleep(wait) {
                return;
            }
        }
        self.on_signal();
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
