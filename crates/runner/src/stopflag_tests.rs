// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

use super::*;

#[test]
fn set_check_clear() {
    let dir = tempfile::tempdir().unwrap();
    let flag = StopFlag::new(dir.path());
    assert!(!flag.is_set());
    flag.set().unwrap();
    assert!(flag.is_set());
    flag.clear().unwrap();
    assert!(!flag.is_set());
}

#[test]
fn clear_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let flag = StopFlag::new(dir.path());
    flag.clear().unwrap();
    flag.clear().unwrap();
}

#[test]
fn set_creates_missing_state_dir() {
    let dir = tempfile::tempdir().unwrap();
    let flag = StopFlag::new(&dir.path().join("nested/state"));
    flag.set().unwrap();
    assert!(flag.is_set());
}
