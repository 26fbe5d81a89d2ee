// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Idle history: per-repo cooldown stamp and round-robin task cursor.

use super::{parse_ts, ts, StateStore};
use crate::error::StorageError;
use ar_core::{IdleHistory, RepoRef};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

impl StateStore {
    /// History for one repo; a repo never idled before gets the default.
    pub fn idle_history(&self, repo: &RepoRef) -> Result<IdleHistory, StorageError> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT last_idle_at, task_cursor FROM idle_history WHERE repo = ?1",
                    params![repo.key()],
                    |row| {
                        Ok((row.get::<_, Option<String>>(0)?, row.get::<_, u64>(1)?))
                    },
                )
                .optional()?;
            Ok(match row {
                Some((last_raw, task_cursor)) => IdleHistory {
                    repo: repo.clone(),
                    last_idle_at: last_raw.and_then(|raw| parse_ts(&raw, "idle_history")),
                    task_cursor,
                },
                None => IdleHistory { repo: repo.clone(), last_idle_at: None, task_cursor: 0 },
            })
        })
    }

    /// Stamp an idle dispatch: sets `last_idle_at` and advances the cursor.
    pub fn mark_idle(
        &self,
        repo: &RepoRef,
        at: DateTime<Utc>,
        next_cursor: u64,
    ) -> Result<(), StorageError> {
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO idle_history (repo, last_idle_at, task_cursor)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(repo) DO UPDATE SET
                   last_idle_at = excluded.last_idle_at,
                   task_cursor = excluded.task_cursor",
                params![repo.key(), ts(at), next_cursor],
            )?;
            Ok(())
        })
    }
}
