// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

use super::{store, t0};
use ar_core::test_support;

#[test]
fn fresh_repo_has_default_history() {
    let store = store();
    let history = store.idle_history(&test_support::repo()).unwrap();
    assert_eq!(history.last_idle_at, None);
    assert_eq!(history.task_cursor, 0);
}

#[test]
fn mark_idle_stamps_and_advances_cursor() {
    let store = store();
    let repo = test_support::repo();

    store.mark_idle(&repo, t0(), 1).unwrap();
    let history = store.idle_history(&repo).unwrap();
    assert_eq!(history.last_idle_at, Some(t0()));
    assert_eq!(history.task_cursor, 1);

    store.mark_idle(&repo, t0() + chrono::Duration::hours(13), 2).unwrap();
    let history = store.idle_history(&repo).unwrap();
    assert_eq!(history.task_cursor, 2);
}

#[test]
fn history_is_keyed_case_insensitively() {
    let store = store();
    store.mark_idle(&ar_core::RepoRef::new("MetyaTech", "Demo"), t0(), 3).unwrap();
    let history = store.idle_history(&test_support::repo()).unwrap();
    assert_eq!(history.task_cursor, 3);
}
