// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Persistent record types owned by the state store
//!
//! These are the rows the store persists between cycles. They are mutated
//! only through the store's API; the in-memory view is rebuilt from the
//! store at the start of every cycle.

use crate::engine::EngineKind;
use crate::id::RunId;
use crate::issue::IssueId;
use crate::repo::RepoRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A live execution tied to an issue. At most one per issue id.
///
/// Inserted when the child process spawns, removed on normal exit, and
/// detected as dead when `pid` is no longer alive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunningRecord {
    pub issue_id: IssueId,
    pub issue_number: u64,
    pub repo: RepoRef,
    pub started_at: DateTime<Utc>,
    pub pid: u32,
    pub log_path: PathBuf,
}

/// What kind of work an activity row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Issue,
    Idle,
}

/// An in-flight unit of work, issue-run or idle-run.
///
/// Distinct from [`RunningRecord`] because idle runs have no issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: RunId,
    pub kind: ActivityKind,
    pub engine: EngineKind,
    pub repo: RepoRef,
    pub started_at: DateTime<Utc>,
    pub pid: u32,
    pub log_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_id: Option<IssueId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
}

/// Why a retry was scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryReason {
    Quota,
}

/// A deferred re-dispatch for a quota-blocked issue. At most one per issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledRetry {
    pub issue_id: IssueId,
    pub issue_number: u64,
    pub repo: RepoRef,
    pub run_after: DateTime<Utc>,
    pub reason: RetryReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Per-repo idle bookkeeping: cooldown stamp and round-robin task cursor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdleHistory {
    pub repo: RepoRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_idle_at: Option<DateTime<Utc>>,
    pub task_cursor: u64,
}

/// A `/agent run` request that arrived through the webhook listener.
/// Unique by issue id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookQueueEntry {
    pub issue_id: IssueId,
    pub issue_number: u64,
    pub repo: RepoRef,
    pub url: String,
    pub title: String,
    pub enqueued_at: DateTime<Utc>,
}

/// Why a review follow-up was enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowupReason {
    ReviewComment,
    Review,
    Approval,
}

/// Follow-up work on a managed PR. Coalesced to one entry per PR.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewFollowupEntry {
    pub issue_id: IssueId,
    pub pr_number: u64,
    pub repo: RepoRef,
    pub url: String,
    pub reason: FollowupReason,
    pub requires_engine: bool,
}
