// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

use super::{store, t0};
use ar_core::test_support;
use ar_core::{FollowupReason, IssueId, ReviewFollowupEntry, WebhookQueueEntry};
use chrono::Duration;

fn entry(number: u64, minutes: i64) -> WebhookQueueEntry {
    let issue = test_support::issue(number).build();
    WebhookQueueEntry {
        issue_id: issue.id,
        issue_number: issue.number,
        repo: issue.repo,
        url: issue.url,
        title: issue.title,
        enqueued_at: t0() + Duration::minutes(minutes),
    }
}

fn followup(pr: u64, reason: FollowupReason, requires_engine: bool) -> ReviewFollowupEntry {
    ReviewFollowupEntry {
        issue_id: IssueId(2_000_000 + pr),
        pr_number: pr,
        repo: test_support::repo(),
        url: format!("https://github.com/metyatech/demo/pull/{pr}"),
        reason,
        requires_engine,
    }
}

#[test]
fn webhook_queue_is_unique_by_issue_and_fifo() {
    let store = store();
    assert!(store.enqueue_webhook(&entry(2, 5)).unwrap());
    assert!(store.enqueue_webhook(&entry(1, 0)).unwrap());
    // Re-enqueue of the same issue keeps the original enqueue time.
    assert!(!store.enqueue_webhook(&entry(1, 30)).unwrap());

    assert_eq!(store.webhook_queue_len().unwrap(), 2);
    let drained = store.take_webhook_entries().unwrap();
    assert_eq!(drained.len(), 2);
    assert_eq!(drained[0].issue_number, 1);
    assert_eq!(drained[1].issue_number, 2);
    assert_eq!(drained[0].enqueued_at, t0());

    assert!(store.take_webhook_entries().unwrap().is_empty());
}

#[test]
fn followups_coalesce_per_pr() {
    let store = store();
    store.upsert_followup(&followup(10, FollowupReason::Approval, false)).unwrap();
    store.upsert_followup(&followup(10, FollowupReason::Review, true)).unwrap();
    // A later merge-only event must not downgrade the engine requirement.
    store.upsert_followup(&followup(10, FollowupReason::Approval, false)).unwrap();

    let all = store.list_followups().unwrap();
    assert_eq!(all.len(), 1);
    assert!(all[0].requires_engine);
    assert_eq!(all[0].reason, FollowupReason::Review);
}

#[test]
fn followups_remove_by_pr() {
    let store = store();
    store.upsert_followup(&followup(10, FollowupReason::Approval, false)).unwrap();
    store.upsert_followup(&followup(11, FollowupReason::Review, true)).unwrap();

    assert!(store.remove_followup(&test_support::repo(), 10).unwrap());
    assert!(!store.remove_followup(&test_support::repo(), 10).unwrap());
    assert_eq!(store.list_followups().unwrap().len(), 1);
}
