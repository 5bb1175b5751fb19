// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::error::Error;
use crate::supervisor::testing::fake_supervisor;
use sg_ipc::DaemonResponse;
use tempfile::tempdir;
use yare::parameterized;

#[parameterized(
    restart = { Command::Restart, DaemonRequest::Restart },
    reset_database = { Command::ResetDatabase, DaemonRequest::ResetDatabase },
    reset_deltas = { Command::ResetDeltas, DaemonRequest::ResetDeltas },
    refresh = { Command::Refresh, DaemonRequest::RefreshNetworkInfo },
    override_changes = {
        Command::Override { folder_id: "photos".to_string() },
        DaemonRequest::OverrideChanges { folder_id: "photos".to_string() }
    },
)]
fn test_request_mapping(command: Command, expected: DaemonRequest) {
    let (request, _) = request_for(command).unwrap();
    assert_eq!(request, expected);
}

#[test]
fn test_ignore_folder_keeps_fields() {
    let (request, done) = request_for(Command::IgnoreFolder {
        device_id: "DEV".to_string(),
        folder_id: "music".to_string(),
        label: "Music".to_string(),
    })
    .unwrap();
    assert_eq!(
        request,
        DaemonRequest::IgnoreFolder {
            device_id: "DEV".to_string(),
            folder_id: "music".to_string(),
            label: "Music".to_string(),
        }
    );
    assert_eq!(done, "Folder ignored.");
}

#[test]
fn test_local_commands_are_not_forwarded() {
    assert!(request_for(Command::Pause).is_none());
    assert!(request_for(Command::Start).is_none());
}

#[test]
fn test_run_prints_done_line() {
    let dir = tempdir().unwrap();
    let server = fake_supervisor(dir.path(), 1, |_| DaemonResponse::Ok);

    let mut out = Vec::new();
    run(dir.path(), &DaemonRequest::Restart, "Restarting syncthing.", &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "Restarting syncthing.\n");
    assert_eq!(server.join().unwrap(), vec![DaemonRequest::Restart]);
}

#[test]
fn test_run_surfaces_refusal_and_prints_nothing() {
    let dir = tempdir().unwrap();
    let server = fake_supervisor(dir.path(), 1, |_| DaemonResponse::Error {
        message: "cannot reset the database while the daemon is error".to_string(),
    });

    let mut out = Vec::new();
    let err = run(dir.path(), &DaemonRequest::ResetDatabase, "done", &mut out).unwrap_err();
    assert!(matches!(err, Error::Rejected(_)));
    assert!(out.is_empty());
    server.join().unwrap();
}
