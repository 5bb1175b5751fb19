// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client for the sync daemon's admin REST API.
//!
//! Calls that the controller forwards on behalf of a user return a
//! [`Pending`] handle that resolves on a worker thread. The daemon's
//! configuration is cached after the first load and kept fresh by the
//! event stream (`ConfigSaved` events carry the full new config).

use chrono::Utc;
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::notifier::Notifier;

const API_KEY_HEADER: &str = "X-API-Key";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Server-side long-poll duration for `/rest/events`.
const EVENT_POLL_SECS: u64 = 10;
const EVENT_BATCH: usize = 100;
const EVENT_RETRY: Duration = Duration::from_secs(1);

/// Result of an admin call that completes on another thread.
pub struct Pending<T> {
    rx: Receiver<Result<T>>,
}

impl<T: Send + 'static> Pending<T> {
    /// Run `f` on a worker thread.
    pub fn spawn(f: impl FnOnce() -> Result<T> + Send + 'static) -> Self {
        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("admin-call".to_string())
            .spawn(move || {
                let _ = tx.send(f());
            });
        if let Err(e) = spawned {
            return Self::ready(Err(e.into()));
        }
        Self { rx }
    }

    /// An already resolved result.
    pub fn ready(result: Result<T>) -> Self {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(result);
        Self { rx }
    }

    pub fn wait(self) -> Result<T> {
        self.rx.recv().unwrap_or(Err(Error::Cancelled))
    }

    pub fn wait_timeout(self, timeout: Duration) -> Result<T> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(Error::Timeout {
                command: "admin request".to_string(),
                secs: timeout.as_secs(),
            }),
            Err(RecvTimeoutError::Disconnected) => Err(Error::Cancelled),
        }
    }
}

/// Where and how to reach the admin API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: String,
    pub api_key: String,
    pub device_id: Option<String>,
}

/// A running background consumer that can be stopped.
pub trait Subscription: Send {
    fn stop(&mut self);
}

/// The admin operations the lifecycle controller relies on.
pub trait AdminApi: Send + Sync {
    fn ignore_device(&self, device_id: &str, name: &str, address: &str) -> Pending<()>;
    fn ignore_folder(&self, device_id: &str, folder_id: &str, label: &str) -> Pending<()>;
    fn override_changes(&self, folder_id: &str) -> Pending<()>;
    fn start_event_stream(&self) -> Result<Box<dyn Subscription>>;
    /// Stop serving calls; later calls fail with `AdminReleased`.
    fn release(&self);
}

/// `/rest/system/status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    #[serde(rename = "myID")]
    pub my_id: String,
    #[serde(default)]
    pub uptime: u64,
    #[serde(default, rename = "startTime")]
    pub start_time: String,
}

/// `/rest/system/version`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    #[serde(default, rename = "longVersion")]
    pub long_version: String,
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub arch: String,
}

/// One entry of `/rest/events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

struct Shared {
    http: Client,
    base: String,
    api_key: String,
    config: RwLock<Option<Value>>,
    released: AtomicBool,
    notifier: Arc<dyn Notifier>,
}

/// Blocking admin API client.
#[derive(Clone)]
pub struct AdminClient {
    shared: Arc<Shared>,
}

impl AdminClient {
    pub fn new(endpoint: &Endpoint, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(true)
            .build()?;
        Ok(Self {
            shared: Arc::new(Shared {
                http,
                base: endpoint.url.trim_end_matches('/').to_string(),
                api_key: endpoint.api_key.clone(),
                config: RwLock::new(None),
                released: AtomicBool::new(false),
                notifier,
            }),
        })
    }

    /// Load and cache the daemon config; the client is usable afterwards.
    pub fn load_config(&self) -> Result<()> {
        let config: Value = self.shared.get("/rest/config", &[])?;
        self.shared.store_config(config);
        let version: VersionInfo = self.shared.get("/rest/system/version", &[])?;
        tracing::info!("connected to daemon {} ({}/{})", version.version, version.os, version.arch);
        Ok(())
    }

    pub fn is_config_loaded(&self) -> bool {
        self.shared.config.read().map(|c| c.is_some()).unwrap_or(false)
    }

    /// The cached daemon config, if loaded.
    pub fn config(&self) -> Option<Value> {
        self.shared.config.read().ok().and_then(|c| c.clone())
    }

    pub fn get_system_info(&self) -> Pending<SystemInfo> {
        let shared = Arc::clone(&self.shared);
        Pending::spawn(move || shared.get("/rest/system/status", &[]))
    }

    pub fn get_version(&self) -> Pending<VersionInfo> {
        let shared = Arc::clone(&self.shared);
        Pending::spawn(move || shared.get("/rest/system/version", &[]))
    }

    pub fn get_config(&self) -> Pending<Value> {
        let shared = Arc::clone(&self.shared);
        Pending::spawn(move || {
            let config: Value = shared.get("/rest/config", &[])?;
            shared.store_config(config.clone());
            Ok(config)
        })
    }

    pub fn set_config(&self, config: Value) -> Pending<()> {
        let shared = Arc::clone(&self.shared);
        Pending::spawn(move || shared.put_config(config))
    }

    pub fn get_events(&self, since: u64, limit: usize) -> Pending<Vec<Event>> {
        let shared = Arc::clone(&self.shared);
        Pending::spawn(move || shared.events(since, limit, 0))
    }
}

impl AdminApi for AdminClient {
    fn ignore_device(&self, device_id: &str, name: &str, address: &str) -> Pending<()> {
        let shared = Arc::clone(&self.shared);
        let (device_id, name, address) = (device_id.to_string(), name.to_string(), address.to_string());
        Pending::spawn(move || {
            shared.edit_config(|config| {
                add_ignored_device(config, &device_id, &name, &address, &now())
            })
        })
    }

    fn ignore_folder(&self, device_id: &str, folder_id: &str, label: &str) -> Pending<()> {
        let shared = Arc::clone(&self.shared);
        let (device_id, folder_id, label) = (device_id.to_string(), folder_id.to_string(), label.to_string());
        Pending::spawn(move || {
            shared.edit_config(|config| {
                add_ignored_folder(config, &device_id, &folder_id, &label, &now())
            })
        })
    }

    fn override_changes(&self, folder_id: &str) -> Pending<()> {
        let shared = Arc::clone(&self.shared);
        let folder_id = folder_id.to_string();
        Pending::spawn(move || {
            let request = shared
                .http
                .post(shared.url("/rest/db/override"))
                .query(&[("folder", folder_id.as_str())]);
            shared.send(request)?;
            tracing::info!("overrode remote changes in folder {}", folder_id);
            Ok(())
        })
    }

    fn start_event_stream(&self) -> Result<Box<dyn Subscription>> {
        Ok(Box::new(EventStream::start(Arc::clone(&self.shared))?))
    }

    fn release(&self) {
        self.shared.released.store(true, Ordering::SeqCst);
    }
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

impl Shared {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn send(&self, request: RequestBuilder) -> Result<reqwest::blocking::Response> {
        if self.released.load(Ordering::SeqCst) {
            return Err(Error::AdminReleased);
        }
        let response = request.header(API_KEY_HEADER, &self.api_key).send()?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default().trim().to_string();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let request = self.http.get(self.url(path)).query(query);
        Ok(self.send(request)?.json()?)
    }

    fn events(&self, since: u64, limit: usize, timeout_secs: u64) -> Result<Vec<Event>> {
        let request = self
            .http
            .get(self.url("/rest/events"))
            .query(&[
                ("since", since.to_string()),
                ("limit", limit.to_string()),
                ("timeout", timeout_secs.to_string()),
            ])
            .timeout(REQUEST_TIMEOUT + Duration::from_secs(timeout_secs));
        Ok(self.send(request)?.json()?)
    }

    fn store_config(&self, config: Value) {
        if let Ok(mut cached) = self.config.write() {
            *cached = Some(config);
        }
    }

    fn put_config(&self, config: Value) -> Result<()> {
        let request = self.http.put(self.url("/rest/config")).json(&config);
        self.send(request)?;
        self.store_config(config);
        self.check_restart_required();
        Ok(())
    }

    /// Apply `edit` to the cached config and push it when it changed.
    fn edit_config(&self, edit: impl FnOnce(&mut Value) -> Result<bool>) -> Result<()> {
        let cached = self.config.read().ok().and_then(|c| c.clone());
        let mut config = match cached {
            Some(config) => config,
            None => self.get("/rest/config", &[])?,
        };
        if edit(&mut config)? {
            self.put_config(config)?;
        }
        Ok(())
    }

    fn check_restart_required(&self) {
        #[derive(Deserialize)]
        struct RestartRequired {
            #[serde(rename = "requiresRestart")]
            requires_restart: bool,
        }
        match self.get::<RestartRequired>("/rest/config/restart-required", &[]) {
            Ok(r) if r.requires_restart => self.notifier.show_restart_prompt(),
            Ok(_) => {}
            Err(e) => tracing::debug!("restart-required check failed: {}", e),
        }
    }
}

/// Record a device as ignored; returns false if it already was.
pub fn add_ignored_device(
    config: &mut Value,
    device_id: &str,
    name: &str,
    address: &str,
    time: &str,
) -> Result<bool> {
    let root = config
        .as_object_mut()
        .ok_or_else(|| Error::NotFound("config object".to_string()))?;
    let list = root
        .entry("remoteIgnoredDevices")
        .or_insert_with(|| Value::Array(Vec::new()));
    let Some(list) = list.as_array_mut() else {
        return Err(Error::NotFound("remoteIgnoredDevices list".to_string()));
    };
    if list.iter().any(|d| d["deviceID"] == device_id) {
        return Ok(false);
    }
    list.push(json!({
        "time": time,
        "deviceID": device_id,
        "name": name,
        "address": address,
    }));
    Ok(true)
}

/// Record a folder offered by `device_id` as ignored; returns false if it already was.
pub fn add_ignored_folder(
    config: &mut Value,
    device_id: &str,
    folder_id: &str,
    label: &str,
    time: &str,
) -> Result<bool> {
    let device = config
        .get_mut("devices")
        .and_then(Value::as_array_mut)
        .and_then(|devices| devices.iter_mut().find(|d| d["deviceID"] == device_id))
        .ok_or_else(|| Error::NotFound(format!("device {device_id}")))?;
    let Some(device) = device.as_object_mut() else {
        return Err(Error::NotFound(format!("device {device_id}")));
    };
    let list = device
        .entry("ignoredFolders")
        .or_insert_with(|| Value::Array(Vec::new()));
    let Some(list) = list.as_array_mut() else {
        return Err(Error::NotFound("ignoredFolders list".to_string()));
    };
    if list.iter().any(|f| f["id"] == folder_id) {
        return Ok(false);
    }
    list.push(json!({ "time": time, "id": folder_id, "label": label }));
    Ok(true)
}

fn str_field<'a>(value: &'a Value, keys: &[&str]) -> &'a str {
    keys.iter()
        .find_map(|k| value.get(*k).and_then(Value::as_str))
        .unwrap_or("")
}

/// React to one daemon event. Returns the new config for `ConfigSaved`.
pub fn dispatch_event(event: &Event, notifier: &dyn Notifier) -> Option<Value> {
    match event.kind.as_str() {
        "ConfigSaved" => event.data.is_object().then(|| event.data.clone()),
        "PendingDevicesChanged" => {
            for device in event.data["added"].as_array().into_iter().flatten() {
                notifier.show_device_request(
                    str_field(device, &["deviceID"]),
                    str_field(device, &["name"]),
                    str_field(device, &["address"]),
                );
            }
            None
        }
        "PendingFoldersChanged" => {
            for folder in event.data["added"].as_array().into_iter().flatten() {
                notifier.show_folder_request(
                    str_field(folder, &["deviceID"]),
                    str_field(folder, &["folderID"]),
                    str_field(folder, &["folderLabel"]),
                );
            }
            None
        }
        "DeviceRejected" => {
            notifier.show_device_request(
                str_field(&event.data, &["device", "deviceID"]),
                str_field(&event.data, &["name"]),
                str_field(&event.data, &["address"]),
            );
            None
        }
        "FolderRejected" => {
            notifier.show_folder_request(
                str_field(&event.data, &["device", "deviceID"]),
                str_field(&event.data, &["folder", "folderID"]),
                str_field(&event.data, &["folderLabel"]),
            );
            None
        }
        other => {
            tracing::trace!("ignoring event {} ({})", event.id, other);
            None
        }
    }
}

/// Long-polls `/rest/events` on a background thread.
pub struct EventStream {
    cancel: CancelToken,
}

impl EventStream {
    fn start(shared: Arc<Shared>) -> Result<Self> {
        let cancel = CancelToken::new();
        let token = cancel.clone();
        thread::Builder::new()
            .name("admin-events".to_string())
            .spawn(move || Self::run(&shared, &token))?;
        Ok(Self { cancel })
    }

    fn run(shared: &Shared, cancel: &CancelToken) {
        // Skip the backlog: start after the newest event.
        let mut since = match shared.events(0, 1, 0) {
            Ok(events) => events.last().map_or(0, |e| e.id),
            Err(_) => 0,
        };
        while !cancel.is_cancelled() {
            match shared.events(since, EVENT_BATCH, EVENT_POLL_SECS) {
                Ok(events) => {
                    for event in events {
                        if cancel.is_cancelled() {
                            return;
                        }
                        since = since.max(event.id);
                        if let Some(config) = dispatch_event(&event, shared.notifier.as_ref()) {
                            shared.store_config(config);
                        }
                    }
                }
                Err(Error::AdminReleased) => return,
                Err(e) => {
                    tracing::debug!("event poll failed: {}", e);
                    if cancel.sleep(EVENT_RETRY) {
                        return;
                    }
                }
            }
        }
    }
}

impl Subscription for EventStream {
    fn stop(&mut self) {
        self.cancel.cancel();
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
#[path = "admin_tests.rs"]
mod tests;
