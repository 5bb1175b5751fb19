// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::notifier::LogNotifier;
use crate::process::ExitKind;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use tempfile::TempDir;

const FAKE_DAEMON: &str = r#"#!/bin/sh
home=""
mode="serve"
while [ $# -gt 0 ]; do
  case "$1" in
    generate) mode=generate ;;
    --home) shift; home="$1" ;;
    --device-id) mode=device ;;
    --reset-database) mode=resetdb ;;
    --reset-deltas) mode=resetdeltas ;;
  esac
  shift
done
case "$mode" in
  generate) printf '<configuration version="37">\n    <gui enabled="true" tls="false">\n    </gui>\n</configuration>\n' > "$home/config.xml" ;;
  device) echo "AAAAAAA-BBBBBBB" ;;
  resetdb) touch "$home/reset-database" ;;
  resetdeltas) touch "$home/reset-deltas" ;;
  serve) while true; do sleep 0.1; done ;;
esac
"#;

struct Fixture {
    dir: TempDir,
    runtime: SyncthingRuntime,
}

fn fake_binary(dir: &Path) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let name = format!(
        "sgr{}x{}",
        std::process::id() % 100_000,
        COUNTER.fetch_add(1, Ordering::SeqCst)
    );
    let path = dir.join(name);
    fs::write(&path, FAKE_DAEMON).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let settings = DaemonSettings {
        binary: fake_binary(dir.path()),
        home: Some(dir.path().join("home")),
        ..DaemonSettings::default()
    };
    let mut runtime = SyncthingRuntime::new(
        settings,
        Arc::new(LogNotifier),
        dir.path().join("syncthing.log"),
    )
    .unwrap();
    runtime.policy = KillPolicy {
        interrupt_wait: Duration::from_millis(100),
        kill_wait: Duration::from_millis(200),
        passes: 2,
        join_timeout: Duration::from_secs(5),
    };
    Fixture { dir, runtime }
}

#[test]
fn prepare_generates_and_migrates_config() {
    let f = fixture();
    let endpoint = f
        .runtime
        .prepare(StartupPlan::SERVE, &CancelToken::new())
        .unwrap()
        .unwrap();

    assert_eq!(endpoint.url, "http://127.0.0.1:8384");
    assert_eq!(endpoint.api_key.len(), 32);
    assert_eq!(endpoint.device_id.as_deref(), Some("AAAAAAA-BBBBBBB"));
    assert!(f.dir.path().join("home/config.xml").is_file());
}

#[test]
fn reset_only_plan_skips_launch_preparation() {
    let f = fixture();
    fs::create_dir_all(f.dir.path().join("home")).unwrap();

    let endpoint = f
        .runtime
        .prepare(
            StartupPlan::reset(DaemonCommand::ResetDeltas, false),
            &CancelToken::new(),
        )
        .unwrap();

    assert_eq!(endpoint, None);
    assert!(f.dir.path().join("home/reset-deltas").is_file());
    assert!(!f.dir.path().join("home/config.xml").exists());
}

#[test]
fn cancelled_prepare_does_nothing() {
    let f = fixture();
    let cancel = CancelToken::new();
    cancel.cancel();

    let err = f.runtime.prepare(StartupPlan::SERVE, &cancel).unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert!(!f.dir.path().join("home/config.xml").exists());
}

#[test]
fn corrupt_config_is_unreadable() {
    let f = fixture();
    fs::create_dir_all(f.dir.path().join("home")).unwrap();
    fs::write(f.dir.path().join("home/config.xml"), "garbage").unwrap();

    let err = f
        .runtime
        .prepare(StartupPlan::SERVE, &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, Error::ConfigUnreadable(_)));
}

#[test]
fn probe_fails_when_nothing_listens() {
    let f = fixture();
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let endpoint = Endpoint {
        url: format!("http://127.0.0.1:{port}"),
        api_key: "k".to_string(),
        device_id: None,
    };
    assert!(!f.runtime.probe(&endpoint));
}

#[test]
fn launched_daemon_is_killed_with_normal_exit() {
    let f = fixture();
    let (tx, rx) = mpsc::channel();
    let mut daemon = f
        .runtime
        .launch(Box::new(move |kind| {
            let _ = tx.send(kind);
        }))
        .unwrap();
    assert!(daemon.pid().is_some());

    daemon.kill();

    assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), ExitKind::Normal);
}
