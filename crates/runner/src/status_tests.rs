// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

use super::*;
use ar_core::test_support;
use chrono::TimeZone;

#[test]
fn gather_reflects_store_contents() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::open_in_memory().unwrap();
    let stop = StopFlag::new(dir.path());
    let now = Utc.with_ymd_and_hms(2026, 2, 11, 10, 0, 0).unwrap();

    let issue = test_support::issue(5).build();
    store
        .insert_activity(&test_support::activity_record(
            &issue,
            ar_core::EngineKind::Codex,
            std::process::id(),
        ))
        .unwrap();
    store.upsert_retry(&test_support::retry(&issue, now, Some("s1")), now).unwrap();

    let snapshot = StatusSnapshot::gather(&store, &stop, now).unwrap();
    assert_eq!(snapshot.running.len(), 1);
    assert!(snapshot.running[0].pid_alive);
    assert_eq!(snapshot.scheduled_retries.len(), 1);
    assert!(!snapshot.stop_requested);

    let text = snapshot.render_text();
    assert!(text.contains("running: 1"));
    assert!(text.contains("issue #5"));
    assert!(text.contains("scheduled retries: 1"));

    let json = serde_json::to_string(&snapshot).unwrap();
    assert!(json.contains("\"webhook_queue_len\":0"));
}

#[test]
fn stop_flag_is_surfaced() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::open_in_memory().unwrap();
    let stop = StopFlag::new(dir.path());
    stop.set().unwrap();
    let snapshot =
        StatusSnapshot::gather(&store, &stop, Utc::now()).unwrap();
    assert!(snapshot.stop_requested);
    assert!(snapshot.render_text().contains("STOP REQUESTED"));
}
