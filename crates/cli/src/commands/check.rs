// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `syncguard check`: evaluate run conditions locally.
//!
//! Uses the same settings file and sensors as the supervisor, so the result
//! matches what a running supervisor would decide right now.

use std::io::Write;
use std::path::Path;

use serde_json::json;
use sg_core::{evaluate, ConditionSensors, RunConditionConfig};
use sgd::sensors::SystemSensors;
use sgd::settings::Settings;
use sgd::PAUSE_MARKER_NAME;

use crate::cli::OutputFormat;
use crate::display;
use crate::error::Result;

pub fn run(
    settings_path: &Path,
    state_dir: &Path,
    output: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let settings = Settings::load(settings_path)?;
    let sensors = SystemSensors::new(state_dir.join(PAUSE_MARKER_NAME));
    report(&settings.run_conditions, &sensors, output, out)
}

/// Evaluate `config` against a fresh snapshot of `sensors` and print it.
pub fn report(
    config: &RunConditionConfig,
    sensors: &dyn ConditionSensors,
    output: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let snapshot = sensors.snapshot();
    let decision = evaluate(config, &snapshot);
    match output {
        OutputFormat::Text => writeln!(out, "{}", display::format_decision(&decision, &snapshot))?,
        OutputFormat::Json => {
            let value = json!({
                "should_run": decision.should_run(),
                "reasons": decision.reasons(),
                "sensors": snapshot,
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "check_tests.rs"]
mod tests;
