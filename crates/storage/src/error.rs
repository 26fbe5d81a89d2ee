// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Storage error type

use ar_core::IssueId;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("issue {issue_id} already has a running record")]
    AlreadyRunning { issue_id: IssueId },

    #[error("timed out waiting for lock {path}")]
    LockTimeout { path: PathBuf },
}
