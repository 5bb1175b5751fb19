// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Signal sources feeding the run-condition monitor.
//!
//! A source knows how to notice that some input of the evaluation may have
//! changed; it never evaluates anything itself. Two kinds exist:
//! - [`PollingSource`]: samples a fingerprint on an interval and fires when
//!   it changes (sysfs, NetworkManager)
//! - [`FileWatchSource`]: fires on inotify events for one file (settings,
//!   the global-sync pause marker)

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::error::Result;

/// Callback fired by a source when its signal may have changed.
pub type Trigger = Arc<dyn Fn() + Send + Sync>;

/// A subscribable source of change notifications.
pub trait SignalSource: Send {
    fn name(&self) -> &str;

    /// Start delivering notifications to `trigger`.
    fn subscribe(&mut self, trigger: Trigger) -> Result<()>;

    /// Stop delivering notifications. Safe to call more than once.
    fn unsubscribe(&mut self);
}

type Sampler<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// Fires when a periodically sampled value changes.
pub struct PollingSource<T> {
    name: String,
    interval: Duration,
    sample: Sampler<T>,
    worker: Option<(CancelToken, JoinHandle<()>)>,
}

impl<T> PollingSource<T>
where
    T: PartialEq + Send + 'static,
{
    pub fn new(
        name: impl Into<String>,
        interval: Duration,
        sample: impl Fn() -> T + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            interval,
            sample: Arc::new(sample),
            worker: None,
        }
    }
}

impl<T> SignalSource for PollingSource<T>
where
    T: PartialEq + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn subscribe(&mut self, trigger: Trigger) -> Result<()> {
        self.unsubscribe();
        let token = CancelToken::new();
        let stop = token.clone();
        let sample = Arc::clone(&self.sample);
        let interval = self.interval;
        let name = self.name.clone();
        let handle = thread::Builder::new()
            .name(format!("poll-{}", self.name))
            .spawn(move || {
                let mut last = sample();
                while !stop.sleep(interval) {
                    let current = sample();
                    if current != last {
                        tracing::debug!("{} changed", name);
                        last = current;
                        trigger();
                    }
                }
            })?;
        self.worker = Some((token, handle));
        Ok(())
    }

    fn unsubscribe(&mut self) {
        if let Some((token, handle)) = self.worker.take() {
            token.cancel();
            if handle.join().is_err() {
                tracing::warn!("{} poller panicked", self.name);
            }
        }
    }
}

impl<T> Drop for PollingSource<T> {
    fn drop(&mut self) {
        if let Some((token, _)) = self.worker.take() {
            token.cancel();
        }
    }
}

/// Fires when a single file is created, modified or removed.
///
/// The parent directory is watched so that atomic replacement and later
/// creation of the file are both seen.
pub struct FileWatchSource {
    name: String,
    path: PathBuf,
    watcher: Option<RecommendedWatcher>,
}

impl FileWatchSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            watcher: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SignalSource for FileWatchSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn subscribe(&mut self, trigger: Trigger) -> Result<()> {
        self.unsubscribe();
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;
        let file_name = self.path.file_name().map(|n| n.to_os_string());

        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    let relevant = matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    );
                    let ours = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if relevant && ours {
                        trigger();
                    }
                }
                Err(e) => tracing::warn!("file watch error: {}", e),
            })?;
        watcher.watch(&parent, RecursiveMode::NonRecursive)?;
        self.watcher = Some(watcher);
        Ok(())
    }

    fn unsubscribe(&mut self) {
        self.watcher = None;
    }
}

#[cfg(test)]
#[path = "signals_tests.rs"]
mod tests;
