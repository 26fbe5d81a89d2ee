// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

use super::{store, t0};
use crate::StorageError;
use ar_core::test_support;
use ar_core::EngineKind;

#[test]
fn at_most_one_running_record_per_issue() {
    let store = store();
    let issue = test_support::issue(5).build();

    store.insert_running(&test_support::running_record(&issue, 100, t0())).unwrap();
    let second = store.insert_running(&test_support::running_record(&issue, 101, t0()));
    assert!(matches!(second, Err(StorageError::AlreadyRunning { issue_id }) if issue_id == issue.id));

    // The original row is intact.
    let rec = store.get_running(issue.id).unwrap().unwrap();
    assert_eq!(rec.pid, 100);
}

#[test]
fn remove_then_reinsert_is_allowed() {
    let store = store();
    let issue = test_support::issue(6).build();

    store.insert_running(&test_support::running_record(&issue, 100, t0())).unwrap();
    assert!(store.remove_running(issue.id).unwrap());
    assert!(!store.remove_running(issue.id).unwrap());
    store.insert_running(&test_support::running_record(&issue, 200, t0())).unwrap();
    assert_eq!(store.get_running(issue.id).unwrap().unwrap().pid, 200);
}

#[test]
fn list_running_roundtrips_fields() {
    let store = store();
    let issue = test_support::issue(7).build();
    let rec = test_support::running_record(&issue, 4242, t0());
    store.insert_running(&rec).unwrap();

    let listed = store.list_running().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].issue_id, issue.id);
    assert_eq!(listed[0].issue_number, issue.number);
    assert_eq!(listed[0].repo, issue.repo);
    assert_eq!(listed[0].started_at, t0());
    assert_eq!(listed[0].log_path, rec.log_path);
}

#[test]
fn activity_tracks_issue_and_idle_kinds() {
    let store = store();
    let issue = test_support::issue(8).build();
    let act = test_support::activity_record(&issue, EngineKind::Codex, 900);
    store.insert_activity(&act).unwrap();

    let mut idle = test_support::activity_record(&issue, EngineKind::GeminiPro, 901);
    idle.kind = ar_core::ActivityKind::Idle;
    idle.issue_id = None;
    idle.issue_number = None;
    idle.task = Some("tidy docs".to_string());
    store.insert_activity(&idle).unwrap();

    let listed = store.list_activity().unwrap();
    assert_eq!(listed.len(), 2);
    let idle_row = listed.iter().find(|a| a.kind == ar_core::ActivityKind::Idle).unwrap();
    assert_eq!(idle_row.task.as_deref(), Some("tidy docs"));
    assert_eq!(idle_row.issue_id, None);

    assert!(store.remove_activity(act.id).unwrap());
    assert_eq!(store.list_activity().unwrap().len(), 1);
}
