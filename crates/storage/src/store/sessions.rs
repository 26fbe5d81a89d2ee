// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Issue → engine-session map.
//!
//! Established when an engine emits a session identifier, cleared on
//! terminal outcomes, and preserved across after-session execution errors
//! so the next attempt resumes the same engine session.

use super::{ts, StateStore};
use crate::error::StorageError;
use ar_core::IssueId;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

impl StateStore {
    pub fn set_session(
        &self,
        issue_id: IssueId,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO issue_sessions (issue_id, session_id, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(issue_id) DO UPDATE SET
                   session_id = excluded.session_id,
                   updated_at = excluded.updated_at",
                params![issue_id.0, session_id, ts(now)],
            )?;
            Ok(())
        })
    }

    pub fn session(&self, issue_id: IssueId) -> Result<Option<String>, StorageError> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT session_id FROM issue_sessions WHERE issue_id = ?1",
                    params![issue_id.0],
                    |row| row.get(0),
                )
                .optional()?)
        })
    }

    pub fn clear_session(&self, issue_id: IssueId) -> Result<bool, StorageError> {
        self.with_tx(|tx| {
            let n = tx.execute(
                "DELETE FROM issue_sessions WHERE issue_id = ?1",
                params![issue_id.0],
            )?;
            Ok(n > 0)
        })
    }
}
