// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Activity records: in-flight units of work, issue or idle.

use super::{parse_ts, ts, StateStore};
use crate::error::StorageError;
use ar_core::{ActivityKind, ActivityRecord, EngineKind, IssueId, RepoRef, RunId};
use rusqlite::{params, Row};
use std::path::PathBuf;

fn from_row(row: &Row<'_>) -> Result<Option<ActivityRecord>, rusqlite::Error> {
    let started_raw: String = row.get("started_at")?;
    let Some(started_at) = parse_ts(&started_raw, "activity") else {
        return Ok(None);
    };
    let kind = match row.get::<_, String>("kind")?.as_str() {
        "issue" => ActivityKind::Issue,
        "idle" => ActivityKind::Idle,
        other => {
            tracing::warn!(kind = other, "corrupt activity kind, skipping row");
            return Ok(None);
        }
    };
    let engine_raw: String = row.get("engine")?;
    let Ok(engine) = engine_raw.parse::<EngineKind>() else {
        tracing::warn!(engine = %engine_raw, "corrupt activity engine, skipping row");
        return Ok(None);
    };
    Ok(Some(ActivityRecord {
        id: RunId::from_string(row.get::<_, String>("id")?),
        kind,
        engine,
        repo: RepoRef::new(row.get::<_, String>("owner")?, row.get::<_, String>("name")?),
        started_at,
        pid: row.get("pid")?,
        log_path: PathBuf::from(row.get::<_, String>("log_path")?),
        issue_id: row.get::<_, Option<u64>>("issue_id")?.map(IssueId),
        issue_number: row.get("issue_number")?,
        task: row.get("task")?,
    }))
}

impl StateStore {
    pub fn insert_activity(&self, rec: &ActivityRecord) -> Result<(), StorageError> {
        let kind = match rec.kind {
            ActivityKind::Issue => "issue",
            ActivityKind::Idle => "idle",
        };
        self.with_tx(|tx| {
            tx.execute(
                "INSERT OR REPLACE INTO activity
                 (id, kind, engine, owner, name, started_at, pid, log_path,
                  issue_id, issue_number, task)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    rec.id.as_str(),
                    kind,
                    rec.engine.as_str(),
                    rec.repo.owner,
                    rec.repo.name,
                    ts(rec.started_at),
                    rec.pid,
                    rec.log_path.display().to_string(),
                    rec.issue_id.map(|id| id.0),
                    rec.issue_number,
                    rec.task,
                ],
            )?;
            Ok(())
        })
    }

    pub fn remove_activity(&self, id: RunId) -> Result<bool, StorageError> {
        self.with_tx(|tx| {
            let n = tx.execute("DELETE FROM activity WHERE id = ?1", params![id.as_str()])?;
            Ok(n > 0)
        })
    }

    pub fn list_activity(&self) -> Result<Vec<ActivityRecord>, StorageError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, kind, engine, owner, name, started_at, pid, log_path,
                        issue_id, issue_number, task
                 FROM activity ORDER BY started_at",
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
