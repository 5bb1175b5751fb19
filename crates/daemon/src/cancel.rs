// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative cancellation for background threads.

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Shared cancellation flag that can also interrupt sleeps.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (lock, cvar) = &*self.inner;
        if let Ok(mut cancelled) = lock.lock() {
            *cancelled = true;
        }
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.0.lock().map(|c| *c).unwrap_or(true)
    }

    /// Returns `Err(Cancelled)` once cancelled.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Sleep for `duration` or until cancelled. Returns true if cancelled.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let (lock, cvar) = &*self.inner;
        let Ok(mut cancelled) = lock.lock() else {
            return true;
        };
        while !*cancelled {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            match cvar.wait_timeout(cancelled, deadline - now) {
                Ok((guard, _)) => cancelled = guard,
                Err(_) => return true,
            }
        }
        true
    }
}

#[cfg(test)]
#[path = "cancel_tests.rs"]
mod tests;
