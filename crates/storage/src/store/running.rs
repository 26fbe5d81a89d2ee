// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Running records: one live execution per issue.

use super::{parse_ts, ts, StateStore};
use crate::error::StorageError;
use ar_core::{IssueId, RepoRef, RunningRecord};
use rusqlite::{params, OptionalExtension, Row};
use std::path::PathBuf;

fn from_row(row: &Row<'_>) -> Result<Option<RunningRecord>, rusqlite::Error> {
    let started_raw: String = row.get("started_at")?;
    let Some(started_at) = parse_ts(&started_raw, "running") else {
        return Ok(None);
    };
    Ok(Some(RunningRecord {
        issue_id: IssueId(row.get("issue_id")?),
        issue_number: row.get("issue_number")?,
        repo: RepoRef::new(row.get::<_, String>("owner")?, row.get::<_, String>("name")?),
        started_at,
        pid: row.get("pid")?,
        log_path: PathBuf::from(row.get::<_, String>("log_path")?),
    }))
}

impl StateStore {
    /// Insert a running record. Fails when the issue already has one.
    pub fn insert_running(&self, rec: &RunningRecord) -> Result<(), StorageError> {
        self.with_tx(|tx| {
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO running
                 (issue_id, issue_number, owner, name, started_at, pid, log_path)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    rec.issue_id.0,
                    rec.issue_number,
                    rec.repo.owner,
                    rec.repo.name,
                    ts(rec.started_at),
                    rec.pid,
                    rec.log_path.display().to_string(),
                ],
            )?;
            if inserted == 0 {
                return Err(StorageError::AlreadyRunning { issue_id: rec.issue_id });
            }
            Ok(())
        })
    }

    /// Remove a running record; returns whether one existed.
    pub fn remove_running(&self, issue_id: IssueId) -> Result<bool, StorageError> {
        self.with_tx(|tx| {
            let n = tx.execute("DELETE FROM running WHERE issue_id = ?1", params![issue_id.0])?;
            Ok(n > 0)
        })
    }

    pub fn get_running(&self, issue_id: IssueId) -> Result<Option<RunningRecord>, StorageError> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT issue_id, issue_number, owner, name, started_at, pid, log_path
                     FROM running WHERE issue_id = ?1",
                    params![issue_id.0],
                    from_row,
                )
                .optional()?;
            Ok(row.flatten())
        })
    }

    pub fn list_running(&self) -> Result<Vec<RunningRecord>, StorageError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT issue_id, issue_number, owner, name, started_at, pid, log_path
                 FROM running ORDER BY started_at",
            )?;
            let rows = stmt.query_map([], from_row)?;
            let mut records = Vec::new();
            for row in rows {
                if let Some(rec) = row? {
                    records.push(rec);
                }
            }
            Ok(records)
        })
    }
}
