// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Test builders and helpers shared with other crates' tests

use crate::engine::EngineKind;
use crate::issue::{Issue, IssueId};
use crate::records::{ActivityKind, ActivityRecord, RunningRecord, ScheduledRetry, RetryReason};
use crate::repo::RepoRef;
use crate::usage::{UsageStatus, UsageWindow, WindowKind};
use crate::RunId;
use chrono::{DateTime, Duration, Utc};
use std::path::PathBuf;

pub fn repo() -> RepoRef {
    RepoRef::new("metyatech", "demo")
}

/// Builder for issue snapshots in tests.
pub struct IssueBuilder {
    issue: Issue,
}

pub fn issue(number: u64) -> IssueBuilder {
    IssueBuilder {
        issue: Issue {
            id: IssueId(1_000_000 + number),
            number,
            title: format!("issue #{number}"),
            body: None,
            author: Some("owner".to_string()),
            repo: repo(),
            labels: Vec::new(),
            url: format!("https://github.com/metyatech/demo/issues/{number}"),
            is_pull_request: false,
        },
    }
}

impl IssueBuilder {
    pub fn repo(mut self, repo: RepoRef) -> Self {
        self.issue.repo = repo;
        self
    }

    pub fn label(mut self, name: &str) -> Self {
        self.issue.labels.push(name.to_string());
        self
    }

    pub fn pull_request(mut self) -> Self {
        self.issue.is_pull_request = true;
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.issue.title = title.to_string();
        self
    }

    pub fn build(self) -> Issue {
        self.issue
    }
}

pub fn running_record(issue: &Issue, pid: u32, started_at: DateTime<Utc>) -> RunningRecord {
    RunningRecord {
        issue_id: issue.id,
        issue_number: issue.number,
        repo: issue.repo.clone(),
        started_at,
        pid,
        log_path: PathBuf::from(format!("logs/demo-issue-{}.log", issue.number)),
    }
}

pub fn activity_record(issue: &Issue, engine: EngineKind, pid: u32) -> ActivityRecord {
    ActivityRecord {
        id: RunId::new(),
        kind: ActivityKind::Issue,
        engine,
        repo: issue.repo.clone(),
        started_at: Utc::now(),
        pid,
        log_path: PathBuf::from(format!("logs/demo-issue-{}.log", issue.number)),
        issue_id: Some(issue.id),
        issue_number: Some(issue.number),
        task: None,
    }
}

pub fn retry(issue: &Issue, run_after: DateTime<Utc>, session: Option<&str>) -> ScheduledRetry {
    ScheduledRetry {
        issue_id: issue.id,
        issue_number: issue.number,
        repo: issue.repo.clone(),
        run_after,
        reason: RetryReason::Quota,
        session_id: session.map(str::to_string),
    }
}

/// A `(short, long)` usage status with both windows present.
pub fn usage_status(
    now: DateTime<Utc>,
    short_pct: f64,
    long_pct: f64,
    long_resets_in_minutes: i64,
) -> UsageStatus {
    UsageStatus {
        short: Some(UsageWindow {
            kind: WindowKind::Short,
            percent_left: short_pct,
            resets_at: now + Duration::hours(5),
        }),
        long: Some(UsageWindow {
            kind: WindowKind::Long,
            percent_left: long_pct,
            resets_at: now + Duration::minutes(long_resets_in_minutes),
        }),
    }
}

/// Proptest strategy over valid percentages.
pub fn percent_strategy() -> impl proptest::strategy::Strategy<Value = f64> {
    0.0f64..=100.0
}
