// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! User settings for the supervisor.
//!
//! Settings live in a TOML file (`$SYNCGUARD_CONFIG`, else
//! `<config_dir>/syncguard/config.toml`) with three sections:
//! - `[daemon]`: how to launch the sync daemon
//! - `[run_conditions]`: the user's run-condition preferences
//! - `[monitor]`: sampling intervals for signal sources
//!
//! Run conditions are re-read from disk on every evaluation, so edits take
//! effect on the next signal without restarting the supervisor.

use serde::{Deserialize, Serialize};
use sg_core::RunConditionConfig;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use crate::env;
use crate::error::Result;

const CONFIG_DIR_NAME: &str = "syncguard";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Complete settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub daemon: DaemonSettings,
    #[serde(default)]
    pub run_conditions: RunConditionConfig,
    #[serde(default)]
    pub monitor: MonitorSettings,
}

/// Verbosity requested from the sync daemon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Info,
    Verbose,
    Debug,
}

/// How the sync daemon is launched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonSettings {
    /// Daemon executable, resolved on `PATH` when relative.
    #[serde(default = "default_binary")]
    pub binary: PathBuf,
    /// Daemon home directory holding `config.xml` and the index database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<PathBuf>,
    #[serde(default)]
    pub log_level: LogLevel,
    /// Debug facilities passed through `STTRACE`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<String>,
    /// Launch through the elevated shell instead of directly.
    #[serde(default)]
    pub use_root: bool,
    /// Command reading a shell script on stdin with elevated privileges.
    #[serde(default = "default_elevate_command")]
    pub elevate_command: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub http_proxy: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub https_proxy: String,
    /// Additional environment variables (feature flags) for the daemon.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_env: BTreeMap<String, String>,
}

fn default_binary() -> PathBuf {
    PathBuf::from("syncthing")
}

fn default_elevate_command() -> Vec<String> {
    vec!["sudo".to_string(), "-n".to_string(), "sh".to_string()]
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            home: None,
            log_level: LogLevel::default(),
            trace: Vec::new(),
            use_root: false,
            elevate_command: default_elevate_command(),
            http_proxy: String::new(),
            https_proxy: String::new(),
            extra_env: BTreeMap::new(),
        }
    }
}

impl DaemonSettings {
    /// Resolved daemon home directory (`~` expanded).
    pub fn home_dir(&self) -> PathBuf {
        match &self.home {
            Some(home) => expand_tilde(home),
            None => dirs::state_dir()
                .or_else(|| dirs::home_dir().map(|h| h.join(".local/state")))
                .unwrap_or_else(|| PathBuf::from(".local/state"))
                .join("syncthing"),
        }
    }

}

/// Sampling configuration for signal sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSettings {
    /// Interval between sysfs and network samples.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Quiet period before a power change is evaluated.
    #[serde(default = "default_power_debounce_ms")]
    pub power_debounce_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_power_debounce_ms() -> u64 {
    5000
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            power_debounce_ms: default_power_debounce_ms(),
        }
    }
}

impl MonitorSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(100))
    }

    pub fn power_debounce(&self) -> Duration {
        Duration::from_millis(self.power_debounce_ms)
    }
}

impl Settings {
    /// Default location of the settings file.
    pub fn default_path() -> PathBuf {
        if let Some(path) = env::config_path() {
            return path;
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Load settings from `path`; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|h| h.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

/// Supplies the current run-condition preferences.
pub trait ConditionSource: Send + Sync {
    fn run_conditions(&self) -> RunConditionConfig;
}

/// Preferences read from the settings file on every call.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConditionSource for SettingsFile {
    fn run_conditions(&self) -> RunConditionConfig {
        match Settings::load(&self.path) {
            Ok(settings) => settings.run_conditions,
            Err(e) => {
                tracing::warn!(
                    "unreadable settings {}, using default run conditions: {}",
                    self.path.display(),
                    e
                );
                RunConditionConfig::default()
            }
        }
    }
}

/// Preferences held in memory.
#[derive(Debug, Default)]
pub struct FixedConditions {
    current: Mutex<RunConditionConfig>,
}

impl FixedConditions {
    pub fn new(config: RunConditionConfig) -> Self {
        Self {
            current: Mutex::new(config),
        }
    }

    pub fn set(&self, config: RunConditionConfig) {
        if let Ok(mut current) = self.current.lock() {
            *current = config;
        }
    }
}

impl ConditionSource for FixedConditions {
    fn run_conditions(&self) -> RunConditionConfig {
        self.current
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
