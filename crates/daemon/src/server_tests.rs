// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::settings::FixedConditions;
use crate::testing::*;
use sg_core::{
    ConditionSensors, FixedSensors, LifecycleState, RunConditionConfig, SensorSnapshot, Transport,
};
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;
use yare::parameterized;

fn service(charging: bool) -> (Arc<FakeRuntime>, Service) {
    let runtime = Arc::new(FakeRuntime::new());
    runtime.gate.open();
    let sensors: Arc<dyn ConditionSensors> = Arc::new(FixedSensors::new(SensorSnapshot {
        charging,
        transport: Some(Transport::Ethernet),
        ..SensorSnapshot::default()
    }));
    let conditions = Arc::new(FixedConditions::new(RunConditionConfig {
        power_source: sg_core::PowerSource::ChargerOnly,
        ..RunConditionConfig::default()
    }));
    let service = Service::start(
        conditions,
        sensors,
        Arc::clone(&runtime) as Arc<dyn crate::runtime::DaemonRuntime>,
        Arc::new(Recorder::default()),
        test_options(),
    )
    .unwrap();
    (runtime, service)
}

#[test]
fn ping_and_hello() {
    let (_runtime, service) = service(false);
    assert_eq!(
        handle_request(DaemonRequest::Ping, &service),
        DaemonResponse::Pong
    );
    assert_eq!(
        handle_request(
            DaemonRequest::Hello {
                version: "0.0.1".into()
            },
            &service
        ),
        DaemonResponse::Hello {
            version: env!("CARGO_PKG_VERSION").to_string()
        }
    );
}

#[test]
fn status_reports_reasons() {
    let (_runtime, service) = service(false);
    let DaemonResponse::Status(status) = handle_request(DaemonRequest::Status, &service) else {
        unreachable!("expected status");
    };
    assert_eq!(status.state, LifecycleState::Disabled);
    assert!(!status.should_run);
    assert_eq!(status.reasons, vec![sg_core::BlockReason::OnBattery]);
}

#[parameterized(
    restart = { DaemonRequest::Restart },
    ignore_device = { DaemonRequest::IgnoreDevice { device_id: "D".into(), name: "n".into(), address: "a".into() } },
    ignore_folder = { DaemonRequest::IgnoreFolder { device_id: "D".into(), folder_id: "f".into(), label: "l".into() } },
    override_changes = { DaemonRequest::OverrideChanges { folder_id: "f".into() } },
)]
fn active_only_requests_fail_when_disabled(request: DaemonRequest) {
    let (_runtime, service) = service(false);
    match handle_request(request, &service) {
        DaemonResponse::Error { message } => assert!(message.contains("disabled"), "{message}"),
        other => unreachable!("unexpected response {other:?}"),
    }
}

#[test]
fn ignore_device_reaches_admin_api() {
    let (runtime, service) = service(true);
    wait_for("active", || service.state() == LifecycleState::Active);

    let response = handle_request(
        DaemonRequest::IgnoreDevice {
            device_id: "DEV1".into(),
            name: "laptop".into(),
            address: "tcp://10.0.0.2".into(),
        },
        &service,
    );

    assert_eq!(response, DaemonResponse::Ok);
    assert!(runtime
        .journal
        .entries()
        .contains(&"ignore device DEV1".to_string()));
}

#[test]
fn refresh_is_accepted() {
    let (_runtime, service) = service(false);
    assert_eq!(
        handle_request(DaemonRequest::RefreshNetworkInfo, &service),
        DaemonResponse::Ok
    );
}

#[test]
fn serve_answers_until_shutdown() {
    let dir = TempDir::new().unwrap();
    let socket = dir.path().join("daemon.sock");
    let listener = UnixListener::bind(&socket).unwrap();
    let (_runtime, service) = service(false);

    thread::scope(|s| {
        let server = s.spawn(|| serve(&listener, &service));

        let mut stream = UnixStream::connect(&socket).unwrap();
        framing::write_request(&mut stream, &DaemonRequest::Ping).unwrap();
        assert_eq!(
            framing::read_response(&mut stream).unwrap(),
            DaemonResponse::Pong
        );

        let mut stream = UnixStream::connect(&socket).unwrap();
        framing::write_request(&mut stream, &DaemonRequest::Shutdown).unwrap();
        assert_eq!(
            framing::read_response(&mut stream).unwrap(),
            DaemonResponse::ShuttingDown
        );

        server.join().unwrap();
    });
}
