// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Run outcome taxonomy and the summary log protocol

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opening delimiter of the summary block an engine emits near the end of
/// its run.
pub const SUMMARY_START: &str = "AGENT_RUNNER_SUMMARY_START";
/// Closing delimiter of the summary block.
pub const SUMMARY_END: &str = "AGENT_RUNNER_SUMMARY_END";
/// Marker an engine emits (inside or outside the summary block) when it
/// needs a clarifying answer from the user before it can continue.
pub const NEEDS_REPLY_MARKER: &str = "AGENT_RUNNER_NEEDS_USER_REPLY";

/// Where in the run an execution error occurred, relative to the engine
/// establishing its session.
///
/// `AfterSession` is the signal for an immediate same-session retry: the
/// engine got far enough to persist resumable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    BeforeSession,
    AfterSession,
}

/// Classified outcome of a single engine run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Quota {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resume_at: Option<DateTime<Utc>>,
    },
    NeedsUserReply,
    ExecutionError {
        stage: FailureStage,
    },
}

impl RunStatus {
    /// True for outcomes that clear the stored session id.
    pub fn clears_session(&self) -> bool {
        matches!(
            self,
            RunStatus::Success
                | RunStatus::ExecutionError { stage: FailureStage::BeforeSession }
        )
    }
}

/// Extract the last `AGENT_RUNNER_SUMMARY_START…END` block from a run log.
///
/// Engines may emit several blocks (retries within one process); the last
/// complete one wins. An unterminated block is ignored.
pub fn extract_summary(log: &str) -> Option<String> {
    let end = log.rfind(SUMMARY_END)?;
    let before_end = &log[..end];
    let start = before_end.rfind(SUMMARY_START)?;
    let body = before_end[start + SUMMARY_START.len()..].trim();
    if body.is_empty() {
        None
    } else {
        Some(body.to_string())
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
