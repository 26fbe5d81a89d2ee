// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

use super::{store, t0};
use ar_core::test_support;
use chrono::Duration;

#[test]
fn take_due_returns_exactly_the_due_rows_once() {
    let store = store();
    let due1 = test_support::issue(1).build();
    let due2 = test_support::issue(2).build();
    let later = test_support::issue(3).build();

    store.upsert_retry(&test_support::retry(&due1, t0(), Some("s1")), t0()).unwrap();
    store
        .upsert_retry(&test_support::retry(&due2, t0() + Duration::minutes(5), None), t0())
        .unwrap();
    store
        .upsert_retry(&test_support::retry(&later, t0() + Duration::hours(2), None), t0())
        .unwrap();

    let cutoff = t0() + Duration::minutes(5);
    let taken = store.take_due_retries(cutoff).unwrap();
    assert_eq!(taken.len(), 2);
    assert_eq!(taken[0].issue_id, due1.id);
    assert_eq!(taken[0].session_id.as_deref(), Some("s1"));
    assert_eq!(taken[1].issue_id, due2.id);

    // Consumed: a second call at the same instant returns nothing.
    assert!(store.take_due_retries(cutoff).unwrap().is_empty());
    // The later row is untouched.
    assert_eq!(store.list_retries().unwrap().len(), 1);
}

#[test]
fn upsert_keeps_at_most_one_per_issue() {
    let store = store();
    let issue = test_support::issue(9).build();

    store.upsert_retry(&test_support::retry(&issue, t0(), None), t0()).unwrap();
    store
        .upsert_retry(
            &test_support::retry(&issue, t0() + Duration::hours(1), Some("s9")),
            t0(),
        )
        .unwrap();

    let all = store.list_retries().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].run_after, t0() + Duration::hours(1));
    assert_eq!(all[0].session_id.as_deref(), Some("s9"));
}

#[test]
fn clear_retry_removes_the_row() {
    let store = store();
    let issue = test_support::issue(4).build();
    store.upsert_retry(&test_support::retry(&issue, t0(), None), t0()).unwrap();

    assert!(store.get_retry(issue.id).unwrap().is_some());
    assert!(store.clear_retry(issue.id).unwrap());
    assert!(store.get_retry(issue.id).unwrap().is_none());
    assert!(!store.clear_retry(issue.id).unwrap());
}

#[test]
fn not_due_rows_stay_put() {
    let store = store();
    let issue = test_support::issue(8).build();
    store
        .upsert_retry(&test_support::retry(&issue, t0() + Duration::minutes(1), None), t0())
        .unwrap();
    assert!(store.take_due_retries(t0()).unwrap().is_empty());
    assert!(store.get_retry(issue.id).unwrap().is_some());
}
