// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! sg-core: run-condition model shared by the syncguard supervisor and CLI.
//!
//! This crate holds the pure parts of the system: user preferences, sensor
//! snapshots, the decision type and the evaluator that turns the former two
//! into the latter. Nothing here touches the operating system.

pub mod condition;
pub mod decision;
pub mod error;
pub mod evaluate;
pub mod sensors;
pub mod state;

pub use condition::{PowerSource, RunConditionConfig};
pub use decision::{BlockReason, RunDecision};
pub use error::{Error, Result};
pub use evaluate::evaluate;
pub use sensors::{ConditionSensors, FixedSensors, SensorSnapshot, Transport};
pub use state::LifecycleState;
