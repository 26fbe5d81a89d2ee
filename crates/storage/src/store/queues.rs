// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Webhook command queue and review follow-up queue.
//!
//! Both queues are written by the webhook listener process and drained by
//! the scheduler process, so they live in the shared store rather than in
//! memory.

use super::{parse_ts, ts, StateStore};
use crate::error::StorageError;
use ar_core::{FollowupReason, IssueId, RepoRef, ReviewFollowupEntry, WebhookQueueEntry};
use rusqlite::{params, Row};

fn queue_entry_from_row(row: &Row<'_>) -> Result<Option<WebhookQueueEntry>, rusqlite::Error> {
    let enqueued_raw: String = row.get("enqueued_at")?;
    let Some(enqueued_at) = parse_ts(&enqueued_raw, "webhook_queue") else {
        return Ok(None);
    };
    Ok(Some(WebhookQueueEntry {
        issue_id: IssueId(row.get("issue_id")?),
        issue_number: row.get("issue_number")?,
        repo: RepoRef::new(row.get::<_, String>("owner")?, row.get::<_, String>("name")?),
        url: row.get("url")?,
        title: row.get("title")?,
        enqueued_at,
    }))
}

fn reason_str(reason: FollowupReason) -> &'static str {
    match reason {
        FollowupReason::ReviewComment => "review_comment",
        FollowupReason::Review => "review",
        FollowupReason::Approval => "approval",
    }
}

fn followup_from_row(row: &Row<'_>) -> Result<Option<ReviewFollowupEntry>, rusqlite::Error> {
    let reason = match row.get::<_, String>("reason")?.as_str() {
        "review_comment" => FollowupReason::ReviewComment,
        "review" => FollowupReason::Review,
        "approval" => FollowupReason::Approval,
        other => {
            tracing::warn!(reason = other, "corrupt follow-up reason, skipping row");
            return Ok(None);
        }
    };
    Ok(Some(ReviewFollowupEntry {
        issue_id: IssueId(row.get("issue_id")?),
        pr_number: row.get("pr_number")?,
        repo: RepoRef::new(row.get::<_, String>("owner")?, row.get::<_, String>("name")?),
        url: row.get("url")?,
        reason,
        requires_engine: row.get::<_, i64>("requires_engine")? != 0,
    }))
}

impl StateStore {
    /// Enqueue a webhook command request. Unique by issue id; the first
    /// enqueue time is kept so FIFO selection stays fair.
    pub fn enqueue_webhook(&self, entry: &WebhookQueueEntry) -> Result<bool, StorageError> {
        self.with_tx(|tx| {
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO webhook_queue
                 (issue_id, issue_number, owner, name, url, title, enqueued_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    entry.issue_id.0,
                    entry.issue_number,
                    entry.repo.owner,
                    entry.repo.name,
                    entry.url,
                    entry.title,
                    ts(entry.enqueued_at),
                ],
            )?;
            Ok(inserted > 0)
        })
    }

    /// Atomically drain the webhook queue, oldest first.
    pub fn take_webhook_entries(&self) -> Result<Vec<WebhookQueueEntry>, StorageError> {
        self.with_tx(|tx| {
            let mut stmt = tx.prepare(
                "SELECT issue_id, issue_number, owner, name, url, title, enqueued_at
                 FROM webhook_queue ORDER BY enqueued_at",
            )?;
            let rows = stmt.query_map([], queue_entry_from_row)?;
            let mut entries = Vec::new();
            for row in rows {
                if let Some(entry) = row? {
                    entries.push(entry);
                }
            }
            drop(stmt);
            tx.execute("DELETE FROM webhook_queue", [])?;
            Ok(entries)
        })
    }

    pub fn webhook_queue_len(&self) -> Result<u64, StorageError> {
        self.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM webhook_queue", [], |row| row.get(0))?)
        })
    }

    /// Insert or coalesce a review follow-up. One entry per PR: an
    /// engine-requiring reason wins over a merge-only one.
    pub fn upsert_followup(&self, entry: &ReviewFollowupEntry) -> Result<(), StorageError> {
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO review_followups
                 (owner, name, pr_number, issue_id, url, reason, requires_engine)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(owner, name, pr_number) DO UPDATE SET
                   issue_id = excluded.issue_id,
                   url = excluded.url,
                   reason = CASE
                     WHEN excluded.requires_engine >= requires_engine THEN excluded.reason
                     ELSE reason
                   END,
                   requires_engine = MAX(requires_engine, excluded.requires_engine)",
                params![
                    entry.repo.owner,
                    entry.repo.name,
                    entry.pr_number,
                    entry.issue_id.0,
                    entry.url,
                    reason_str(entry.reason),
                    entry.requires_engine as i64,
                ],
            )?;
            Ok(())
        })
    }

    pub fn list_followups(&self) -> Result<Vec<ReviewFollowupEntry>, StorageError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT owner, name, pr_number, issue_id, url, reason, requires_engine
                 FROM review_followups ORDER BY owner, name, pr_number",
            )?;
            let rows = stmt.query_map([], followup_from_row)?;
            let mut entries = Vec::new();
            for row in rows {
                if let Some(entry) = row? {
                    entries.push(entry);
                }
            }
            Ok(entries)
        })
    }

    pub fn remove_followup(&self, repo: &RepoRef, pr_number: u64) -> Result<bool, StorageError> {
        self.with_tx(|tx| {
            let n = tx.execute(
                "DELETE FROM review_followups
                 WHERE owner = ?1 COLLATE NOCASE AND name = ?2 COLLATE NOCASE AND pr_number = ?3",
                params![repo.owner, repo.name, pr_number],
            )?;
            Ok(n > 0)
        })
    }
}
