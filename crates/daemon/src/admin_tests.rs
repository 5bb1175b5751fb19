// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use sg_core::LifecycleState;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::Mutex;
use yare::parameterized;

/// A request received by [`TestServer`].
#[derive(Debug, Clone)]
struct Seen {
    method: String,
    path: String,
    api_key: Option<String>,
    body: String,
}

/// Minimal HTTP/1.1 server answering from a route table.
struct TestServer {
    url: String,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl TestServer {
    fn start(routes: Vec<(&'static str, &'static str, u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut request_line = String::new();
                if reader.read_line(&mut request_line).is_err() {
                    continue;
                }
                let mut parts = request_line.split_whitespace();
                let method = parts.next().unwrap_or("").to_string();
                let target = parts.next().unwrap_or("").to_string();
                let mut api_key = None;
                let mut length = 0usize;
                loop {
                    let mut line = String::new();
                    if reader.read_line(&mut line).unwrap_or(0) == 0 {
                        break;
                    }
                    let line = line.trim_end();
                    if line.is_empty() {
                        break;
                    }
                    if let Some((name, value)) = line.split_once(':') {
                        match name.to_ascii_lowercase().as_str() {
                            "x-api-key" => api_key = Some(value.trim().to_string()),
                            "content-length" => length = value.trim().parse().unwrap_or(0),
                            _ => {}
                        }
                    }
                }
                let mut body = vec![0u8; length];
                let _ = reader.read_exact(&mut body);
                let path = target.split('?').next().unwrap_or("").to_string();
                log.lock().unwrap().push(Seen {
                    method: method.clone(),
                    path: target.clone(),
                    api_key,
                    body: String::from_utf8_lossy(&body).into_owned(),
                });
                let (status, payload) = routes
                    .iter()
                    .find(|(m, p, _, _)| *m == method && *p == path)
                    .map(|(_, _, s, b)| (*s, b.clone()))
                    .unwrap_or((404, "not found".to_string()));
                let response = format!(
                    "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
                    payload.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        Self { url, seen }
    }

    fn endpoint(&self) -> Endpoint {
        Endpoint {
            url: self.url.clone(),
            api_key: "secret".to_string(),
            device_id: None,
        }
    }

    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

/// Notifier recording every call.
#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<String>>,
}

impl Notifier for Recorder {
    fn show_crashed(&self, reason: &str) {
        self.calls.lock().unwrap().push(format!("crashed:{reason}"));
    }
    fn show_restart_prompt(&self) {
        self.calls.lock().unwrap().push("restart".to_string());
    }
    fn update_persistent_status(&self, state: LifecycleState) {
        self.calls.lock().unwrap().push(format!("status:{state}"));
    }
    fn show_permission_revoked(&self) {
        self.calls.lock().unwrap().push("revoked".to_string());
    }
    fn show_device_request(&self, device_id: &str, name: &str, address: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("device:{device_id}:{name}:{address}"));
    }
    fn show_folder_request(&self, device_id: &str, folder_id: &str, label: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("folder:{device_id}:{folder_id}:{label}"));
    }
}

fn config_json() -> String {
    json!({
        "version": 37,
        "devices": [{ "deviceID": "PEER-1", "name": "laptop" }],
        "remoteIgnoredDevices": [],
    })
    .to_string()
}

fn version_json() -> String {
    json!({ "version": "v1.27.0", "longVersion": "syncthing v1.27.0", "os": "linux", "arch": "amd64" })
        .to_string()
}

#[test]
fn pending_ready_and_spawned_resolve() {
    assert_eq!(Pending::ready(Ok(4)).wait().unwrap(), 4);
    assert_eq!(Pending::spawn(|| Ok("done")).wait().unwrap(), "done");
}

#[test]
fn pending_wait_timeout_expires() {
    let pending: Pending<()> = Pending::spawn(|| {
        thread::sleep(Duration::from_millis(500));
        Ok(())
    });
    let err = pending.wait_timeout(Duration::from_millis(20)).unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }));
}

#[test]
fn load_config_caches_and_sends_api_key() {
    let server = TestServer::start(vec![
        ("GET", "/rest/config", 200, config_json()),
        ("GET", "/rest/system/version", 200, version_json()),
    ]);
    let client = AdminClient::new(&server.endpoint(), Arc::new(Recorder::default())).unwrap();
    assert!(!client.is_config_loaded());

    client.load_config().unwrap();

    assert!(client.is_config_loaded());
    assert_eq!(client.config().unwrap()["version"], 37);
    assert!(server
        .seen()
        .iter()
        .all(|s| s.api_key.as_deref() == Some("secret")));
}

#[test]
fn typed_getters_parse_responses() {
    let server = TestServer::start(vec![
        ("GET", "/rest/system/version", 200, version_json()),
        (
            "GET",
            "/rest/system/status",
            200,
            json!({ "myID": "SELF-ID", "uptime": 12, "startTime": "2026-01-01T00:00:00Z" })
                .to_string(),
        ),
    ]);
    let client = AdminClient::new(&server.endpoint(), Arc::new(Recorder::default())).unwrap();

    assert_eq!(client.get_version().wait().unwrap().version, "v1.27.0");
    let info = client.get_system_info().wait().unwrap();
    assert_eq!(info.my_id, "SELF-ID");
    assert_eq!(info.uptime, 12);
}

#[test]
fn api_errors_carry_status() {
    let server = TestServer::start(vec![("GET", "/rest/config", 403, "CSRF Error".to_string())]);
    let client = AdminClient::new(&server.endpoint(), Arc::new(Recorder::default())).unwrap();
    match client.load_config().unwrap_err() {
        Error::Api { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "CSRF Error");
        }
        other => unreachable!("unexpected error: {other}"),
    }
}

#[test]
fn ignore_device_puts_config_and_prompts_restart() {
    let server = TestServer::start(vec![
        ("GET", "/rest/config", 200, config_json()),
        ("GET", "/rest/system/version", 200, version_json()),
        ("PUT", "/rest/config", 200, String::new()),
        (
            "GET",
            "/rest/config/restart-required",
            200,
            json!({ "requiresRestart": true }).to_string(),
        ),
    ]);
    let notifier = Arc::new(Recorder::default());
    let client = AdminClient::new(&server.endpoint(), notifier.clone()).unwrap();
    client.load_config().unwrap();

    client
        .ignore_device("STRANGER", "phone", "tcp://10.0.0.9:22000")
        .wait()
        .unwrap();

    let put = server
        .seen()
        .into_iter()
        .find(|s| s.method == "PUT")
        .unwrap();
    let body: Value = serde_json::from_str(&put.body).unwrap();
    assert_eq!(body["remoteIgnoredDevices"][0]["deviceID"], "STRANGER");
    assert_eq!(
        client.config().unwrap()["remoteIgnoredDevices"][0]["name"],
        "phone"
    );
    assert_eq!(*notifier.calls.lock().unwrap(), vec!["restart"]);
}

#[test]
fn override_changes_posts_folder_id() {
    let server = TestServer::start(vec![("POST", "/rest/db/override", 200, String::new())]);
    let client = AdminClient::new(&server.endpoint(), Arc::new(Recorder::default())).unwrap();

    client.override_changes("abcd-1234").wait().unwrap();

    let seen = server.seen();
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].path, "/rest/db/override?folder=abcd-1234");
}

#[test]
fn released_client_refuses_calls() {
    let server = TestServer::start(vec![]);
    let client = AdminClient::new(&server.endpoint(), Arc::new(Recorder::default())).unwrap();
    client.release();

    let err = client.override_changes("f").wait().unwrap_err();
    assert!(matches!(err, Error::AdminReleased));
    assert!(server.seen().is_empty());
}

#[test]
fn ignored_device_is_added_once() {
    let mut config = json!({});
    assert!(add_ignored_device(&mut config, "D1", "n", "a", "t").unwrap());
    assert!(!add_ignored_device(&mut config, "D1", "n", "a", "t").unwrap());
    assert_eq!(config["remoteIgnoredDevices"].as_array().unwrap().len(), 1);
}

#[test]
fn ignored_folder_attaches_to_device() {
    let mut config: Value = serde_json::from_str(&config_json()).unwrap();
    assert!(add_ignored_folder(&mut config, "PEER-1", "photos", "Photos", "t").unwrap());
    assert!(!add_ignored_folder(&mut config, "PEER-1", "photos", "Photos", "t").unwrap());
    assert_eq!(config["devices"][0]["ignoredFolders"][0]["label"], "Photos");

    let err = add_ignored_folder(&mut config, "UNKNOWN", "x", "x", "t").unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[parameterized(
    pending_device = {
        "PendingDevicesChanged",
        json!({ "added": [{ "deviceID": "D1", "name": "phone", "address": "1.2.3.4" }] }),
        "device:D1:phone:1.2.3.4"
    },
    pending_folder = {
        "PendingFoldersChanged",
        json!({ "added": [{ "deviceID": "D1", "folderID": "f1", "folderLabel": "Docs" }] }),
        "folder:D1:f1:Docs"
    },
    rejected_device = {
        "DeviceRejected",
        json!({ "device": "D2", "name": "tv", "address": "5.6.7.8" }),
        "device:D2:tv:5.6.7.8"
    },
    rejected_folder = {
        "FolderRejected",
        json!({ "device": "D3", "folder": "f3", "folderLabel": "Music" }),
        "folder:D3:f3:Music"
    },
)]
fn events_raise_notifications(kind: &str, data: Value, expected: &str) {
    let notifier = Recorder::default();
    let event = Event {
        id: 1,
        kind: kind.to_string(),
        data,
    };
    assert_eq!(dispatch_event(&event, &notifier), None);
    assert_eq!(*notifier.calls.lock().unwrap(), vec![expected.to_string()]);
}

#[test]
fn config_saved_event_replaces_cache() {
    let notifier = Recorder::default();
    let event = Event {
        id: 7,
        kind: "ConfigSaved".to_string(),
        data: json!({ "version": 38 }),
    };
    assert_eq!(dispatch_event(&event, &notifier), Some(json!({ "version": 38 })));

    let other = Event {
        id: 8,
        kind: "StateChanged".to_string(),
        data: json!({}),
    };
    assert_eq!(dispatch_event(&other, &notifier), None);
    assert!(notifier.calls.lock().unwrap().is_empty());
}
