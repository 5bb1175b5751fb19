// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Behavioral specs for the `syncguard` CLI.
//!
//! The spec files under `cli/` are compiled as `[[test]]` targets of the
//! CLI crate so they can run the real binary.
