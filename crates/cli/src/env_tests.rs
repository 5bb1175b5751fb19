// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

#[test]
fn test_vars_constants() {
    assert_eq!(vars::NO_COLOR, "NO_COLOR");
    assert_eq!(vars::COLOR, "COLOR");
    assert_eq!(vars::SYNCGUARD_DAEMON_BINARY, "SYNCGUARD_DAEMON_BINARY");
}

#[test]
fn test_no_color_only_accepts_one() {
    std::env::set_var("NO_COLOR", "true");
    assert!(!no_color());
    std::env::set_var("NO_COLOR", "1");
    assert!(no_color());
    std::env::remove_var("NO_COLOR");
    assert!(!no_color());
}

#[test]
fn test_force_color_only_accepts_one() {
    std::env::set_var("COLOR", "yes");
    assert!(!force_color());
    std::env::set_var("COLOR", "1");
    assert!(force_color());
    std::env::remove_var("COLOR");
    assert!(!force_color());
}

#[test]
fn test_daemon_binary_override() {
    std::env::set_var("SYNCGUARD_DAEMON_BINARY", "/opt/sg/syncguardd");
    assert_eq!(daemon_binary(), Some(PathBuf::from("/opt/sg/syncguardd")));
    std::env::remove_var("SYNCGUARD_DAEMON_BINARY");
    assert_eq!(daemon_binary(), None);
}
