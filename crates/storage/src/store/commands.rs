// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Dedup of processed `/agent run` command comments.

use super::StateStore;
use crate::error::StorageError;
use rusqlite::params;

impl StateStore {
    /// Record a command comment id. Returns `false` when the comment was
    /// already processed, so the same comment never enqueues twice.
    pub fn record_command_comment(&self, comment_id: u64) -> Result<bool, StorageError> {
        self.with_tx(|tx| {
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO processed_command_comments (comment_id) VALUES (?1)",
                params![comment_id],
            )?;
            Ok(inserted > 0)
        })
    }
}
