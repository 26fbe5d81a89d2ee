// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! The embedded state store
//!
//! One SQLite file under `state/runner.db`. Each table group lives in its
//! own submodule; every mutating operation runs inside a transaction so a
//! concurrent reader never observes a torn write.

mod activity;
mod commands;
mod idle;
mod managed;
mod meta;
mod queues;
mod retries;
mod running;
mod sessions;

use crate::error::StorageError;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS repos (
    owner TEXT NOT NULL,
    name  TEXT NOT NULL,
    PRIMARY KEY (owner, name)
);
CREATE TABLE IF NOT EXISTS running (
    issue_id     INTEGER PRIMARY KEY,
    issue_number INTEGER NOT NULL,
    owner        TEXT NOT NULL,
    name         TEXT NOT NULL,
    started_at   TEXT NOT NULL,
    pid          INTEGER NOT NULL,
    log_path     TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS activity (
    id           TEXT PRIMARY KEY,
    kind         TEXT NOT NULL,
    engine       TEXT NOT NULL,
    owner        TEXT NOT NULL,
    name         TEXT NOT NULL,
    started_at   TEXT NOT NULL,
    pid          INTEGER NOT NULL,
    log_path     TEXT NOT NULL,
    issue_id     INTEGER,
    issue_number INTEGER,
    task         TEXT
);
CREATE TABLE IF NOT EXISTS scheduled_retries (
    issue_id     INTEGER PRIMARY KEY,
    issue_number INTEGER NOT NULL,
    owner        TEXT NOT NULL,
    name         TEXT NOT NULL,
    run_after    TEXT NOT NULL,
    reason       TEXT NOT NULL,
    session_id   TEXT,
    updated_at   TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS issue_sessions (
    issue_id   INTEGER PRIMARY KEY,
    session_id TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS managed_prs (
    owner  TEXT NOT NULL,
    name   TEXT NOT NULL,
    number INTEGER NOT NULL,
    PRIMARY KEY (owner, name, number)
);
CREATE TABLE IF NOT EXISTS processed_command_comments (
    comment_id INTEGER PRIMARY KEY
);
CREATE TABLE IF NOT EXISTS idle_history (
    repo         TEXT PRIMARY KEY,
    last_idle_at TEXT,
    task_cursor  INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS webhook_queue (
    issue_id     INTEGER PRIMARY KEY,
    issue_number INTEGER NOT NULL,
    owner        TEXT NOT NULL,
    name         TEXT NOT NULL,
    url          TEXT NOT NULL,
    title        TEXT NOT NULL,
    enqueued_at  TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS review_followups (
    owner           TEXT NOT NULL,
    name            TEXT NOT NULL,
    pr_number       INTEGER NOT NULL,
    issue_id        INTEGER NOT NULL,
    url             TEXT NOT NULL,
    reason          TEXT NOT NULL,
    requires_engine INTEGER NOT NULL,
    PRIMARY KEY (owner, name, pr_number)
);
CREATE TABLE IF NOT EXISTS amazon_q_usage (
    day_start TEXT PRIMARY KEY,
    count     INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS gemini_warmup (
    model           TEXT PRIMARY KEY,
    last_attempt_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

/// Handle to the embedded store. Cheap to share behind an `Arc`.
pub struct StateStore {
    conn: Mutex<Connection>,
}

impl StateStore {
    /// Open (and migrate) the store at `state_dir/runner.db`.
    pub fn open(state_dir: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(state_dir)?;
        let conn = Connection::open(state_dir.join("runner.db"))?;
        Self::init(conn)
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "busy_timeout", 5_000)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Run `f` inside a transaction, committing on `Ok`.
    pub(crate) fn with_tx<T>(
        &self,
        f: impl FnOnce(&rusqlite::Transaction<'_>) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Run `f` with a plain connection (read paths).
    pub(crate) fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let conn = self.conn.lock();
        f(&conn)
    }
}

/// Format an instant for storage.
pub(crate) fn ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339()
}

/// Parse a stored instant. Corrupt values are logged and treated as
/// missing, never rewritten.
pub(crate) fn parse_ts(raw: &str, table: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(at) => Some(at.with_timezone(&Utc)),
        Err(e) => {
            tracing::warn!(table, raw, error = %e, "corrupt timestamp in state store, skipping");
            None
        }
    }
}

#[cfg(test)]
#[path = "../store_tests/mod.rs"]
mod tests;
