// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

use super::*;
use chrono::TimeZone;

const PORCELAIN: &str = "\
worktree /srv/agents/agent-runner/git-cache/metyatech/demo.git
bare

worktree /srv/agents/agent-runner/work/run-aaa/metyatech--demo
HEAD 1111111111111111111111111111111111111111
branch refs/heads/fix/x

worktree /srv/agents/agent-runner/work/run-bbb/metyatech--demo
HEAD 2222222222222222222222222222222222222222
detached
";

#[test]
fn parses_porcelain_entries() {
    let entries = parse_worktree_list(PORCELAIN);
    assert_eq!(entries.len(), 3);

    assert_eq!(
        entries[0].path,
        PathBuf::from("/srv/agents/agent-runner/git-cache/metyatech/demo.git")
    );
    assert_eq!(entries[0].branch, None);

    assert_eq!(entries[1].branch.as_deref(), Some("refs/heads/fix/x"));
    assert_eq!(
        entries[1].head.as_deref(),
        Some("1111111111111111111111111111111111111111")
    );

    assert_eq!(entries[2].branch, None);
}

#[test]
fn parses_empty_output() {
    assert!(parse_worktree_list("").is_empty());
}

fn entry(path: &Path) -> WorktreeInfo {
    WorktreeInfo {
        path: path.to_path_buf(),
        head: Some("abc".to_string()),
        branch: Some("refs/heads/fix/x".to_string()),
    }
}

#[test]
fn conflict_on_target_path_is_removed() {
    let target = PathBuf::from("/nonexistent/work/run-1/o--r");
    let action = resolve_conflict(&entry(&target), &target, &|_| OwnerLiveness::Live {
        description: "ignored".to_string(),
    });
    assert_eq!(action, ConflictAction::Remove);
}

#[test]
fn conflict_on_missing_path_is_pruned() {
    let target = PathBuf::from("/nonexistent/work/run-1/o--r");
    let gone = PathBuf::from("/nonexistent/work/run-2/o--r");
    let action = resolve_conflict(&entry(&gone), &target, &|_| OwnerLiveness::Live {
        description: "ignored".to_string(),
    });
    assert_eq!(action, ConflictAction::Prune);
}

#[test]
fn conflict_with_dead_owner_is_removed() {
    let dir = tempfile::tempdir().unwrap();
    let target = PathBuf::from("/nonexistent/work/run-1/o--r");
    let action = resolve_conflict(&entry(dir.path()), &target, &|_| OwnerLiveness::Dead);
    assert_eq!(action, ConflictAction::Remove);
}

#[test]
fn conflict_with_live_owner_fails_with_the_owner_named() {
    let dir = tempfile::tempdir().unwrap();
    let target = PathBuf::from("/nonexistent/work/run-1/o--r");
    let action = resolve_conflict(&entry(dir.path()), &target, &|_| OwnerLiveness::Live {
        description: "issue metyatech/demo#100 (pid 4242)".to_string(),
    });
    match action {
        ConflictAction::Fail(message) => {
            assert!(message.contains("issue metyatech/demo#100"));
            assert!(message.contains(&dir.path().display().to_string()));
        }
        other => panic!("expected fail, got {other:?}"),
    }
}

#[test]
fn run_branch_is_prefixed_and_timestamped() {
    let now = chrono::Utc.with_ymd_and_hms(2026, 2, 11, 10, 0, 30).unwrap();
    let run_id = ar_core::RunId::from_string("run-abcdef0123456789012");
    let branch = WorktreeManager::run_branch("issue", now, &run_id);
    assert!(branch.starts_with("agent-runner/issue-20260211-100030-"));
    assert!(branch.ends_with("abcdef"));
}

#[test]
fn hook_blocks_protected_branches_only() {
    assert!(PRE_PUSH_HOOK.contains("refs/heads/main|refs/heads/master"));
    assert!(PRE_PUSH_HOOK.contains("exit 1"));
    assert!(PRE_PUSH_HOOK.trim_end().ends_with("exit 0"));
    assert!(PRE_PUSH_HOOK.starts_with("#!/bin/sh"));
}

#[test]
fn work_path_layout() {
    let config = ar_core::RunnerConfig {
        workdir_root: PathBuf::from("/srv/agents"),
        ..Default::default()
    };
    let manager = WorktreeManager::new(&config);
    let run_id = ar_core::RunId::from_string("run-xyz");
    let path = manager.work_path(&run_id, &ar_core::RepoRef::new("metyatech", "demo"));
    assert_eq!(
        path,
        PathBuf::from("/srv/agents/agent-runner/work/run-xyz/metyatech--demo")
    );
}
