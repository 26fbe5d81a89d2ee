// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Workspace-level spec tests: the cross-crate invariants the scheduler
//! guarantees, exercised against the real store and locks.

use ar_core::test_support;
use ar_core::{
    evaluate_usage_gate, FakeClock, Clock, GateConfig, GateDecision, IssueState, LabelNames,
};
use ar_storage::{RunnerLock, StateStore};
use chrono::{Duration, TimeZone, Utc};

fn t0() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 11, 10, 0, 0).unwrap()
}

/// At-most-one runner: a second driver against the same workdir must see
/// the lock as held and exit cleanly.
#[test]
fn single_writer_runner_lock() {
    let workdir = tempfile::tempdir().unwrap();
    let first = RunnerLock::acquire(workdir.path()).unwrap();
    assert!(first.is_some());
    assert!(RunnerLock::acquire(workdir.path()).unwrap().is_none());
    drop(first);
    assert!(RunnerLock::acquire(workdir.path()).unwrap().is_some());
}

/// Single active run per issue, across everything the store accepts.
#[test]
fn at_most_one_running_record_per_issue() {
    let store = StateStore::open_in_memory().unwrap();
    let issue = test_support::issue(5).build();
    store.insert_running(&test_support::running_record(&issue, 100, t0())).unwrap();
    assert!(store.insert_running(&test_support::running_record(&issue, 200, t0())).is_err());
    assert_eq!(store.list_running().unwrap().len(), 1);
}

/// Session continuity: quota retry carries the session; terminal
/// outcomes clear it.
#[test]
fn session_continuity_through_retry() {
    let store = StateStore::open_in_memory().unwrap();
    let issue = test_support::issue(7).build();
    let clock = FakeClock::at(t0());

    // Engine emitted session s1, then hit quota; the retry keeps s1.
    store.set_session(issue.id, "s1", clock.now()).unwrap();
    store
        .upsert_retry(
            &test_support::retry(&issue, clock.now() + Duration::hours(1), Some("s1")),
            clock.now(),
        )
        .unwrap();

    clock.advance(Duration::hours(1) + Duration::seconds(5));
    let due = store.take_due_retries(clock.now()).unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].session_id.as_deref(), Some("s1"));
    assert_eq!(store.session(issue.id).unwrap().as_deref(), Some("s1"));

    // Terminal success clears both.
    store.clear_session(issue.id).unwrap();
    store.clear_retry(issue.id).unwrap();
    assert_eq!(store.session(issue.id).unwrap(), None);
}

/// Retry ordering: take-due returns exactly the due rows and consumes
/// them; a second call at the same instant is empty.
#[test]
fn retry_take_due_is_exact_and_consuming() {
    let store = StateStore::open_in_memory().unwrap();
    let a = test_support::issue(1).build();
    let b = test_support::issue(2).build();
    let c = test_support::issue(3).build();
    store.upsert_retry(&test_support::retry(&a, t0() + Duration::minutes(1), None), t0()).unwrap();
    store.upsert_retry(&test_support::retry(&b, t0() + Duration::minutes(2), None), t0()).unwrap();
    store.upsert_retry(&test_support::retry(&c, t0() + Duration::hours(9), None), t0()).unwrap();

    let cutoff = t0() + Duration::minutes(5);
    let taken = store.take_due_retries(cutoff).unwrap();
    let numbers: Vec<u64> = taken.iter().map(|r| r.issue_number).collect();
    assert_eq!(numbers, vec![1, 2]);
    assert!(store.take_due_retries(cutoff).unwrap().is_empty());
    assert_eq!(store.list_retries().unwrap().len(), 1);
}

/// Label exclusivity: after applying any legal transition plan, the
/// agent-label subset matches exactly one legal state.
#[test]
fn label_plans_keep_states_legal() {
    let names = LabelNames::default();
    let start = vec![names.queued.clone(), "user-label".to_string()];

    for state in [
        IssueState::Queued,
        IssueState::Running,
        IssueState::Done,
        IssueState::FailedTerminal,
        IssueState::ScheduledRetry,
    ] {
        let mut labels = start.clone();
        LabelNames::apply(&names.plan(state), &mut labels);
        let marks = names.marks(&labels);
        let count = [marks.queued, marks.running, marks.done, marks.failed]
            .iter()
            .filter(|present| **present)
            .count();
        assert_eq!(count, 1, "state {state:?} must leave exactly one status label");
        assert!(labels.contains(&"user-label".to_string()));
    }

    // needs-user-reply may coexist with failed, and only with failed.
    let mut labels = vec![names.failed.clone()];
    LabelNames::apply(&names.plan(IssueState::NeedsUserReply), &mut labels);
    let marks = names.marks(&labels);
    assert!(marks.needs_user_reply && marks.failed);
    assert!(!marks.queued && !marks.running && !marks.done);
}

/// Usage-gate ramp: the spec's worked example, plus the boundary
/// properties at the ends of the ramp.
#[test]
fn usage_gate_ramp_scenario() {
    let gate = GateConfig {
        start_minutes: 60.0,
        start_pct: 20.0,
        end_pct: 0.0,
        short_floor_pct: 5.0,
    };
    let now = t0();

    // long 60% left / resets in 30m, short 10% left → required 10, allow.
    let status = test_support::usage_status(now, 10.0, 60.0, 30);
    assert!(matches!(evaluate_usage_gate(now, &status, &gate), GateDecision::Allow { .. }));

    // short at 4% violates the floor.
    let status = test_support::usage_status(now, 4.0, 60.0, 30);
    assert!(matches!(evaluate_usage_gate(now, &status, &gate), GateDecision::Deny { .. }));

    // Boundaries: required(0) == end_pct, required(start) == start_pct.
    assert!((ar_core::required_percent(0.0, &gate) - 0.0).abs() < f64::EPSILON);
    assert!((ar_core::required_percent(60.0, &gate) - 20.0).abs() < 1e-9);
}

/// Command dedup: the same comment id never enqueues twice, even across
/// store handles on the same file.
#[test]
fn command_dedup_across_store_handles() {
    let dir = tempfile::tempdir().unwrap();
    let first = StateStore::open(dir.path()).unwrap();
    assert!(first.record_command_comment(777).unwrap());
    drop(first);
    let second = StateStore::open(dir.path()).unwrap();
    assert!(!second.record_command_comment(777).unwrap());
}

/// Webhook queue entries are unique by issue and drain FIFO.
#[test]
fn webhook_queue_fifo_and_unique() {
    let store = StateStore::open_in_memory().unwrap();
    let early = test_support::issue(1).build();
    let late = test_support::issue(2).build();
    for (issue, minutes) in [(&late, 10i64), (&early, 0)] {
        store
            .enqueue_webhook(&ar_core::WebhookQueueEntry {
                issue_id: issue.id,
                issue_number: issue.number,
                repo: issue.repo.clone(),
                url: issue.url.clone(),
                title: issue.title.clone(),
                enqueued_at: t0() + Duration::minutes(minutes),
            })
            .unwrap();
    }
    let drained = store.take_webhook_entries().unwrap();
    assert_eq!(drained[0].issue_number, 1);
    assert_eq!(drained[1].issue_number, 2);
    assert!(store.take_webhook_entries().unwrap().is_empty());
}
