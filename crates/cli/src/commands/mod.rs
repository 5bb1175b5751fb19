// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Command implementations.
//!
//! Each command takes the state directory explicitly and writes to a
//! caller-supplied writer so tests can drive it without a terminal.

pub mod check;
pub mod control;
pub mod pause;
pub mod supervisor;
