// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Scheduled retries for quota-blocked issues.

use super::{parse_ts, ts, StateStore};
use crate::error::StorageError;
use ar_core::{IssueId, RepoRef, RetryReason, ScheduledRetry};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

fn from_row(row: &Row<'_>) -> Result<Option<ScheduledRetry>, rusqlite::Error> {
    let after_raw: String = row.get("run_after")?;
    let Some(run_after) = parse_ts(&after_raw, "scheduled_retries") else {
        return Ok(None);
    };
    Ok(Some(ScheduledRetry {
        issue_id: IssueId(row.get("issue_id")?),
        issue_number: row.get("issue_number")?,
        repo: RepoRef::new(row.get::<_, String>("owner")?, row.get::<_, String>("name")?),
        run_after,
        reason: RetryReason::Quota,
        session_id: row.get("session_id")?,
    }))
}

impl StateStore {
    /// Insert or replace the retry for an issue (at most one per issue).
    pub fn upsert_retry(
        &self,
        retry: &ScheduledRetry,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO scheduled_retries
                 (issue_id, issue_number, owner, name, run_after, reason, session_id, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 'quota', ?6, ?7)
                 ON CONFLICT(issue_id) DO UPDATE SET
                   issue_number = excluded.issue_number,
                   owner = excluded.owner,
                   name = excluded.name,
                   run_after = excluded.run_after,
                   reason = excluded.reason,
                   session_id = excluded.session_id,
                   updated_at = excluded.updated_at",
                params![
                    retry.issue_id.0,
                    retry.issue_number,
                    retry.repo.owner,
                    retry.repo.name,
                    ts(retry.run_after),
                    retry.session_id,
                    ts(now),
                ],
            )?;
            Ok(())
        })
    }

    /// Atomically return and delete every retry due at `now`.
    ///
    /// A second call at the same instant returns the empty set.
    pub fn take_due_retries(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScheduledRetry>, StorageError> {
        self.with_tx(|tx| {
            let mut stmt = tx.prepare(
                "SELECT issue_id, issue_number, owner, name, run_after, reason, session_id
                 FROM scheduled_retries WHERE run_after <= ?1 ORDER BY run_after",
            )?;
            let rows = stmt.query_map(params![ts(now)], from_row)?;
            let mut due = Vec::new();
            for row in rows {
                if let Some(retry) = row? {
                    due.push(retry);
                }
            }
            drop(stmt);
            // Delete by the same cutoff so corrupt (skipped) rows are also
            // cleared rather than replaying forever.
            tx.execute("DELETE FROM scheduled_retries WHERE run_after <= ?1", params![ts(now)])?;
            Ok(due)
        })
    }

    pub fn get_retry(&self, issue_id: IssueId) -> Result<Option<ScheduledRetry>, StorageError> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT issue_id, issue_number, owner, name, run_after, reason, session_id
                     FROM scheduled_retries WHERE issue_id = ?1",
                    params![issue_id.0],
                    from_row,
                )
                .optional()?;
            Ok(row.flatten())
        })
    }

    pub fn clear_retry(&self, issue_id: IssueId) -> Result<bool, StorageError> {
        self.with_tx(|tx| {
            let n = tx.execute(
                "DELETE FROM scheduled_retries WHERE issue_id = ?1",
                params![issue_id.0],
            )?;
            Ok(n > 0)
        })
    }

    pub fn list_retries(&self) -> Result<Vec<ScheduledRetry>, StorageError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT issue_id, issue_number, owner, name, run_after, reason, session_id
                 FROM scheduled_retries ORDER BY run_after",
            )?;
            let rows = stmt.query_map([], from_row)?;
            let mut all = Vec::new();
            for row in rows {
                if let Some(retry) = row? {
                    all.push(retry);
                }
            }
            Ok(all)
        })
    }
}
