// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

use super::*;

#[test]
fn prunes_only_old_files() {
    let dir = tempfile::tempdir().unwrap();
    let old = dir.path().join("old.log");
    let fresh = dir.path().join("fresh.log");
    std::fs::write(&old, "x").unwrap();
    std::fs::write(&fresh, "x").unwrap();

    // Both files carry "now" mtimes; against a +30d clock with 14-day
    // retention they are both stale.
    let future = Utc::now() + Duration::days(30);
    let affected = prune_older_than(dir.path(), 14, future, false).unwrap();
    assert_eq!(affected, vec![fresh.clone(), old.clone()]);
    assert!(!old.exists());
    assert!(!fresh.exists());
}

#[test]
fn dry_run_keeps_files() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("a.log");
    std::fs::write(&file, "x").unwrap();
    let future = Utc::now() + Duration::days(30);
    let affected = prune_older_than(dir.path(), 14, future, true).unwrap();
    assert_eq!(affected.len(), 1);
    assert!(file.exists());
}

#[test]
fn recent_files_survive() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.log"), "x").unwrap();
    let affected = prune_older_than(dir.path(), 14, Utc::now(), false).unwrap();
    assert!(affected.is_empty());
}

#[test]
fn missing_dir_is_empty_not_an_error() {
    let affected =
        prune_older_than(Path::new("/nonexistent/logs"), 14, Utc::now(), false).unwrap();
    assert!(affected.is_empty());
}
