// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Listener registries.
//!
//! Delivery takes a snapshot of the registered callbacks and releases the
//! registry lock before calling any of them, so a listener may register or
//! unregister listeners from inside its callback. A panicking listener is
//! logged and skipped; the remaining listeners still run.

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Handle returned on registration, used to unregister.
pub type ListenerId = u64;

/// Callback invoked with each delivered value.
pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

pub struct Listeners<T> {
    name: &'static str,
    next_id: AtomicU64,
    registry: Mutex<Registry<T>>,
}

struct Registry<T> {
    entries: Vec<(ListenerId, Listener<T>)>,
    /// Allocated but not yet inserted.
    reserved: HashSet<ListenerId>,
}

impl<T> Listeners<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            next_id: AtomicU64::new(1),
            registry: Mutex::new(Registry {
                entries: Vec::new(),
                reserved: HashSet::new(),
            }),
        }
    }

    /// Reserve an id without registering anything yet.
    ///
    /// Removing a reserved id cancels the later [`Listeners::insert`].
    pub fn allocate_id(&self) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut registry) = self.registry.lock() {
            registry.reserved.insert(id);
        }
        id
    }

    pub fn add(&self, listener: Listener<T>) -> ListenerId {
        let id = self.allocate_id();
        self.insert(id, listener);
        id
    }

    /// Register under an id obtained from [`Listeners::allocate_id`].
    ///
    /// Returns false if the id was removed before it was inserted.
    pub fn insert(&self, id: ListenerId, listener: Listener<T>) -> bool {
        match self.registry.lock() {
            Ok(mut registry) => {
                if !registry.reserved.remove(&id) {
                    return false;
                }
                registry.entries.push((id, listener));
                true
            }
            Err(_) => false,
        }
    }

    /// Returns true if a listener, or a pending reservation, was removed.
    pub fn remove(&self, id: ListenerId) -> bool {
        match self.registry.lock() {
            Ok(mut registry) => {
                if registry.reserved.remove(&id) {
                    return true;
                }
                let before = registry.entries.len();
                registry.entries.retain(|(entry_id, _)| *entry_id != id);
                registry.entries.len() != before
            }
            Err(_) => false,
        }
    }

    pub fn len(&self) -> usize {
        self.registry.lock().map(|r| r.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `value` to every registered listener.
    pub fn deliver(&self, value: &T) {
        let snapshot: Vec<(ListenerId, Listener<T>)> = match self.registry.lock() {
            Ok(registry) => registry.entries.clone(),
            Err(_) => return,
        };
        for (id, listener) in snapshot {
            invoke_guarded(self.name, id, || listener(value));
        }
    }

    /// Deliver `value` to a single listener, if still registered.
    pub fn deliver_to(&self, id: ListenerId, value: &T) {
        let listener = match self.registry.lock() {
            Ok(registry) => registry
                .entries
                .iter()
                .find(|(entry_id, _)| *entry_id == id)
                .map(|(_, l)| Arc::clone(l)),
            Err(_) => None,
        };
        if let Some(listener) = listener {
            invoke_guarded(self.name, id, || listener(value));
        }
    }
}

/// Run a callback, logging instead of propagating a panic.
pub fn invoke_guarded(kind: &str, id: ListenerId, f: impl FnOnce()) {
    if panic::catch_unwind(AssertUnwindSafe(f)).is_err() {
        tracing::error!("{} listener {} panicked", kind, id);
    }
}

#[cfg(test)]
#[path = "listeners_tests.rs"]
mod tests;
