// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use std::thread;

#[test]
fn check_fails_after_cancel() {
    let token = CancelToken::new();
    assert!(token.check().is_ok());
    token.clone().cancel();
    assert!(token.is_cancelled());
    assert!(matches!(token.check(), Err(Error::Cancelled)));
}

#[test]
fn sleep_runs_to_completion_without_cancel() {
    let token = CancelToken::new();
    let start = Instant::now();
    assert!(!token.sleep(Duration::from_millis(30)));
    assert!(start.elapsed() >= Duration::from_millis(30));
}

#[test]
fn cancel_interrupts_sleep() {
    let token = CancelToken::new();
    let sleeper = token.clone();
    let handle = thread::spawn(move || {
        let start = Instant::now();
        let cancelled = sleeper.sleep(Duration::from_secs(30));
        (cancelled, start.elapsed())
    });
    thread::sleep(Duration::from_millis(20));
    token.cancel();

    let (cancelled, elapsed) = handle.join().unwrap();
    assert!(cancelled);
    assert!(elapsed < Duration::from_secs(5));
}
