// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

use super::*;
use ar_core::test_support;
use chrono::Utc;

fn records(entries: &[(IssueId, u32)]) -> HashMap<IssueId, RunningRecord> {
    entries
        .iter()
        .map(|(id, pid)| {
            let issue = test_support::issue(id.0).build();
            let mut record = test_support::running_record(&issue, *pid, Utc::now());
            record.issue_id = *id;
            (*id, record)
        })
        .collect()
}

#[test]
fn live_pid_keeps_running() {
    let id = IssueId(1);
    let records = records(&[(id, 100)]);
    let decision = judge(id, &records, &|_| true);
    assert_eq!(decision, CrashDecision::StillRunning);
}

#[test]
fn dead_pid_is_reported_with_the_pid() {
    let id = IssueId(2);
    let records = records(&[(id, 4242)]);
    let decision = judge(id, &records, &|_| false);
    assert_eq!(decision, CrashDecision::DeadProcess { pid: 4242 });
}

#[test]
fn missing_record_is_its_own_case() {
    let decision = judge(IssueId(3), &HashMap::new(), &|_| true);
    assert_eq!(decision, CrashDecision::MissingRecord);
}
