// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

use super::StateStore;
use ar_core::test_support;
use chrono::{Duration, TimeZone, Utc};

mod idle;
mod meta;
mod queues;
mod retries;
mod running;

fn store() -> StateStore {
    StateStore::open_in_memory().unwrap()
}

fn t0() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 11, 10, 0, 0).unwrap()
}

#[test]
fn open_creates_the_db_file() {
    let dir = tempfile::tempdir().unwrap();
    let _store = StateStore::open(dir.path()).unwrap();
    assert!(dir.path().join("runner.db").exists());
}

#[test]
fn sessions_set_get_clear() {
    let store = store();
    let issue = test_support::issue(5).build();

    assert_eq!(store.session(issue.id).unwrap(), None);
    store.set_session(issue.id, "s1", t0()).unwrap();
    assert_eq!(store.session(issue.id).unwrap().as_deref(), Some("s1"));

    // Upsert replaces.
    store.set_session(issue.id, "s2", t0() + Duration::minutes(1)).unwrap();
    assert_eq!(store.session(issue.id).unwrap().as_deref(), Some("s2"));

    assert!(store.clear_session(issue.id).unwrap());
    assert!(!store.clear_session(issue.id).unwrap());
    assert_eq!(store.session(issue.id).unwrap(), None);
}

#[test]
fn command_comments_deduplicate() {
    let store = store();
    assert!(store.record_command_comment(42).unwrap());
    assert!(!store.record_command_comment(42).unwrap());
    assert!(store.record_command_comment(43).unwrap());
}

#[test]
fn managed_prs_roundtrip() {
    let store = store();
    let repo = test_support::repo();

    assert!(!store.is_managed_pr(&repo, 7).unwrap());
    store.add_managed_pr(&repo, 7).unwrap();
    store.add_managed_pr(&repo, 7).unwrap();
    assert!(store.is_managed_pr(&repo, 7).unwrap());

    // Case-insensitive repo matching.
    let upper = ar_core::RepoRef::new("MetyaTech", "Demo");
    assert!(store.is_managed_pr(&upper, 7).unwrap());

    assert_eq!(store.list_managed_prs().unwrap().len(), 1);
    assert!(store.remove_managed_pr(&repo, 7).unwrap());
    assert!(!store.is_managed_pr(&repo, 7).unwrap());
}
