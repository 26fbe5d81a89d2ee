// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Crash recovery: reconcile running-labelled issues against the running
//! records and actual process liveness.
//!
//! A dead pid and a missing record are treated the same way: the run is
//! gone, the issue becomes failed + needs-user-reply with a comment, and
//! stale records are purged.

use ar_core::{Issue, IssueId, RunningRecord};
use std::collections::HashMap;

use crate::context::RunnerCtx;
use crate::error::RunnerError;
use crate::lifecycle;
use crate::process::pid_alive;

/// Decision for one running-labelled issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrashDecision {
    /// Record present and pid alive: leave it running.
    StillRunning,
    /// Record present, pid dead.
    DeadProcess { pid: u32 },
    /// No record at all.
    MissingRecord,
}

/// Pure decision: cross-reference one issue with the records and a
/// liveness probe.
pub fn judge(
    issue_id: IssueId,
    records: &HashMap<IssueId, RunningRecord>,
    is_alive: &dyn Fn(u32) -> bool,
) -> CrashDecision {
    match records.get(&issue_id) {
        None => CrashDecision::MissingRecord,
        Some(record) if is_alive(record.pid) => CrashDecision::StillRunning,
        Some(record) => CrashDecision::DeadProcess { pid: record.pid },
    }
}

/// Recover stalled runs among `issues` (the running-labelled subset) and
/// purge records whose issue no longer carries the running label.
pub async fn recover_stalled(ctx: &RunnerCtx, issues: &[Issue]) -> Result<(), RunnerError> {
    let records: HashMap<IssueId, RunningRecord> = ctx
        .store
        .list_running()?
        .into_iter()
        .map(|record| (record.issue_id, record))
        .collect();

    for issue in issues {
        if !issue.has_label(&ctx.config.labels.running) {
            continue;
        }
        match judge(issue.id, &records, &pid_alive) {
            CrashDecision::StillRunning => {}
            CrashDecision::DeadProcess { pid } => {
                tracing::warn!(issue = %issue, pid, "running process is dead, failing issue");
                fail_crashed(ctx, issue, Some(pid)).await?;
            }
            CrashDecision::MissingRecord => {
                tracing::warn!(issue = %issue, "running label without a record, failing issue");
                fail_crashed(ctx, issue, None).await?;
            }
        }
    }

    // Purge stale records: a record whose pid is dead has no live child
    // regardless of labels.
    for record in records.values() {
        if !pid_alive(record.pid) {
            tracing::info!(
                issue_id = %record.issue_id,
                pid = record.pid,
                "purging stale running record"
            );
            ctx.store.remove_running(record.issue_id)?;
        }
    }
    // Activity rows follow the same liveness rule.
    for activity in ctx.store.list_activity()? {
        if !pid_alive(activity.pid) {
            ctx.store.remove_activity(activity.id)?;
        }
    }
    Ok(())
}

async fn fail_crashed(ctx: &RunnerCtx, issue: &Issue, pid: Option<u32>) -> Result<(), RunnerError> {
    lifecycle::transition_crashed(&ctx.gh, &ctx.config.labels, issue).await?;
    let body = match pid {
        Some(pid) => lifecycle::comment_crashed(pid),
        None => format!(
            "{}\n💥 The run for this issue vanished without a trace (no running \
             record). Reply here to re-queue it.",
            lifecycle::NEEDS_REPLY_COMMENT_MARKER
        ),
    };
    ctx.gh.create_comment(&issue.repo, issue.number, &body).await?;
    ctx.store.remove_running(issue.id)?;
    Ok(())
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
