// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Issue lifecycle application: label plans plus the human-readable
//! comments that accompany each transition.

use ar_core::{Issue, IssueState, LabelNames};
use ar_github::GithubClient;
use chrono::{DateTime, Local, Utc};

use crate::error::RunnerError;

/// Machine-readable marker embedded in the needs-user-reply comment, so a
/// later cycle can find the boundary when scanning for user replies.
pub const NEEDS_REPLY_COMMENT_MARKER: &str = "<!-- agent-runner:needs-user-reply -->";

pub fn comment_done(summary: Option<&str>) -> String {
    match summary {
        Some(summary) => format!("✅ Run finished.\n\n{summary}"),
        None => "✅ Run finished (no summary emitted).".to_string(),
    }
}

pub fn comment_quota(resume_at: DateTime<Utc>) -> String {
    let local = resume_at.with_timezone(&Local);
    format!(
        "⏳ The engine is out of quota. This issue is scheduled to resume \
         automatically at {} (local time).",
        local.format("%Y-%m-%d %H:%M %Z")
    )
}

pub fn comment_needs_reply(question: Option<&str>) -> String {
    let mut body = String::from(NEEDS_REPLY_COMMENT_MARKER);
    body.push('\n');
    body.push_str("❓ The engine needs your input before it can continue.");
    if let Some(question) = question {
        body.push_str("\n\n");
        body.push_str(question);
    }
    body.push_str("\n\nReply on this issue and the runner will pick it back up.");
    body
}

pub fn comment_failed(summary_tail: &str) -> String {
    if summary_tail.trim().is_empty() {
        "❌ Run failed with no output. See the runner logs for details.".to_string()
    } else {
        format!("❌ Run failed. Last output:\n\n```\n{summary_tail}\n```")
    }
}

pub fn comment_crashed(pid: u32) -> String {
    format!(
        "{NEEDS_REPLY_COMMENT_MARKER}\n💥 The run for this issue died unexpectedly \
         (process {pid} is gone). Reply here to re-queue it."
    )
}

/// Apply a state transition to the issue's labels (adds before removes).
pub async fn transition(
    gh: &GithubClient,
    labels: &LabelNames,
    issue: &Issue,
    state: IssueState,
) -> Result<(), RunnerError> {
    let plan = labels.plan(state);
    gh.apply_label_plan(&issue.repo, issue.number, &plan).await?;
    tracing::info!(issue = %issue, state = ?state, "issue transitioned");
    Ok(())
}

/// Crash-recovery transition: failed + needs-user-reply in one mutation.
pub async fn transition_crashed(
    gh: &GithubClient,
    labels: &LabelNames,
    issue: &Issue,
) -> Result<(), RunnerError> {
    let plan = labels.plan_crashed();
    gh.apply_label_plan(&issue.repo, issue.number, &plan).await?;
    Ok(())
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
