// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Managed PRs: pull requests whose lifecycle this scheduler tracks.

use super::StateStore;
use crate::error::StorageError;
use ar_core::RepoRef;
use rusqlite::params;

impl StateStore {
    pub fn add_managed_pr(&self, repo: &RepoRef, number: u64) -> Result<(), StorageError> {
        self.with_tx(|tx| {
            tx.execute(
                "INSERT OR IGNORE INTO managed_prs (owner, name, number) VALUES (?1, ?2, ?3)",
                params![repo.owner, repo.name, number],
            )?;
            Ok(())
        })
    }

    pub fn is_managed_pr(&self, repo: &RepoRef, number: u64) -> Result<bool, StorageError> {
        self.with_conn(|conn| {
            let count: u32 = conn.query_row(
                "SELECT COUNT(*) FROM managed_prs
                 WHERE owner = ?1 COLLATE NOCASE AND name = ?2 COLLATE NOCASE AND number = ?3",
                params![repo.owner, repo.name, number],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    pub fn list_managed_prs(&self) -> Result<Vec<(RepoRef, u64)>, StorageError> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT owner, name, number FROM managed_prs ORDER BY owner, name, number")?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    RepoRef::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?),
                    row.get::<_, u64>(2)?,
                ))
            })?;
            rows.collect::<Result<Vec<_>, _>>().map_err(StorageError::from)
        })
    }

    pub fn remove_managed_pr(&self, repo: &RepoRef, number: u64) -> Result<bool, StorageError> {
        self.with_tx(|tx| {
            let n = tx.execute(
                "DELETE FROM managed_prs
                 WHERE owner = ?1 COLLATE NOCASE AND name = ?2 COLLATE NOCASE AND number = ?3",
                params![repo.owner, repo.name, number],
            )?;
            Ok(n > 0)
        })
    }
}
