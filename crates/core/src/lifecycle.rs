// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Issue lifecycle states and label plans
//!
//! Labels are the externally observable state; the canonical machine state
//! lives in the persistent records. Each transition is expressed as a
//! [`LabelPlan`] whose additions are applied before its removals, so an
//! observer of an intermediate state always sees the *new* status even if
//! a removal fails.

use serde::{Deserialize, Serialize};

/// Lifecycle states of an issue under management.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueState {
    Queued,
    Running,
    NeedsUserReply,
    ScheduledRetry,
    Done,
    FailedTerminal,
}

/// Configurable names of the five agent labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelNames {
    pub queued: String,
    pub running: String,
    pub done: String,
    pub failed: String,
    pub needs_user_reply: String,
}

impl Default for LabelNames {
    fn default() -> Self {
        Self {
            queued: "agent:queued".to_string(),
            running: "agent:running".to_string(),
            done: "agent:done".to_string(),
            failed: "agent:failed".to_string(),
            needs_user_reply: "agent:needs-user-reply".to_string(),
        }
    }
}

/// Ordered label mutation: `add` is applied before `remove`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelPlan {
    pub add: Vec<String>,
    pub remove: Vec<String>,
}

/// Which agent labels are present on an issue snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LabelMarks {
    pub queued: bool,
    pub running: bool,
    pub done: bool,
    pub failed: bool,
    pub needs_user_reply: bool,
}

impl LabelNames {
    pub fn all(&self) -> [&str; 5] {
        [&self.queued, &self.running, &self.done, &self.failed, &self.needs_user_reply]
    }

    /// Read the agent-label subset of an issue's labels.
    pub fn marks(&self, labels: &[String]) -> LabelMarks {
        let has = |name: &str| labels.iter().any(|l| l == name);
        LabelMarks {
            queued: has(&self.queued),
            running: has(&self.running),
            done: has(&self.done),
            failed: has(&self.failed),
            needs_user_reply: has(&self.needs_user_reply),
        }
    }

    /// Label plan for a normal transition into `state`.
    pub fn plan(&self, state: IssueState) -> LabelPlan {
        let mut plan = LabelPlan::default();
        let mut keep = |name: &String| plan.add.push(name.clone());
        match state {
            IssueState::Queued => keep(&self.queued),
            IssueState::Running => keep(&self.running),
            IssueState::Done => keep(&self.done),
            IssueState::FailedTerminal | IssueState::ScheduledRetry => keep(&self.failed),
            IssueState::NeedsUserReply => keep(&self.needs_user_reply),
        }
        for name in self.all() {
            if !plan.add.iter().any(|a| a == name) {
                // needs-user-reply may coexist with failed; never strip
                // failed when entering needs-user-reply.
                if state == IssueState::NeedsUserReply && name == self.failed {
                    continue;
                }
                plan.remove.push(name.to_string());
            }
        }
        plan
    }

    /// Label plan for crash recovery: the issue becomes failed *and*
    /// needs-user-reply in one mutation.
    pub fn plan_crashed(&self) -> LabelPlan {
        LabelPlan {
            add: vec![self.failed.clone(), self.needs_user_reply.clone()],
            remove: vec![self.queued.clone(), self.running.clone(), self.done.clone()],
        }
    }

    /// Apply a plan to a label set, in plan order. Used by tests and the
    /// dry-run path; the live path applies the same ordering via the
    /// GitHub adapter.
    pub fn apply(plan: &LabelPlan, labels: &mut Vec<String>) {
        for add in &plan.add {
            if !labels.iter().any(|l| l == add) {
                labels.push(add.clone());
            }
        }
        labels.retain(|l| !plan.remove.iter().any(|r| r == l));
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
