// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Status snapshot for the CLI and the HTML UI.

use ar_core::{ActivityRecord, ScheduledRetry};
use ar_storage::StateStore;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::RunnerError;
use crate::process::pid_alive;
use crate::stopflag::StopFlag;

#[derive(Debug, Serialize)]
pub struct RunningEntry {
    #[serde(flatten)]
    pub activity: ActivityRecord,
    pub pid_alive: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusSnapshot {
    pub generated_at: DateTime<Utc>,
    pub stop_requested: bool,
    pub running: Vec<RunningEntry>,
    pub scheduled_retries: Vec<ScheduledRetry>,
    pub webhook_queue_len: u64,
    pub review_followups: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limited_until: Option<DateTime<Utc>>,
}

impl StatusSnapshot {
    pub fn gather(
        store: &StateStore,
        stop: &StopFlag,
        now: DateTime<Utc>,
    ) -> Result<Self, RunnerError> {
        let running = store
            .list_activity()?
            .into_iter()
            .map(|activity| {
                let alive = pid_alive(activity.pid);
                RunningEntry { activity, pid_alive: alive }
            })
            .collect();
        Ok(Self {
            generated_at: now,
            stop_requested: stop.is_set(),
            running,
            scheduled_retries: store.list_retries()?,
            webhook_queue_len: store.webhook_queue_len()?,
            review_followups: store.list_followups()?.len(),
            rate_limited_until: store.rate_limited_until()?,
        })
    }

    /// Plain-text rendering for the terminal.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("agent-runner status @ {}\n", self.generated_at.to_rfc3339()));
        if self.stop_requested {
            out.push_str("STOP REQUESTED — no new work will be scheduled\n");
        }
        if let Some(until) = self.rate_limited_until {
            out.push_str(&format!("GitHub rate limited until {}\n", until.to_rfc3339()));
        }
        out.push_str(&format!("running: {}\n", self.running.len()));
        for entry in &self.running {
            let what = match entry.activity.issue_number {
                Some(n) => format!("issue #{n}"),
                None => format!(
                    "idle: {}",
                    entry.activity.task.as_deref().unwrap_or("?")
                ),
            };
            out.push_str(&format!(
                "  {} {} {} pid={}{}\n",
                entry.activity.repo,
                entry.activity.engine,
                what,
                entry.activity.pid,
                if entry.pid_alive { "" } else { " (dead)" },
            ));
        }
        out.push_str(&format!("scheduled retries: {}\n", self.scheduled_retries.len()));
        for retry in &self.scheduled_retries {
            out.push_str(&format!(
                "  {}#{} at {}\n",
                retry.repo,
                retry.issue_number,
                retry.run_after.to_rfc3339()
            ));
        }
        out.push_str(&format!("webhook queue: {}\n", self.webhook_queue_len));
        out.push_str(&format!("review follow-ups: {}\n", self.review_followups));
        out
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
