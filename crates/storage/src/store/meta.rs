// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Small singletons: cached repo list, catch-up cursor, rate-limit
//! deadline, Amazon Q day counters, Gemini warm-up stamps.

use super::{parse_ts, ts, StateStore};
use crate::error::StorageError;
use ar_core::RepoRef;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

const KEY_WEBHOOK_CATCHUP: &str = "webhook_catchup_last_run";
const KEY_RATE_LIMITED_UNTIL: &str = "rate_limited_until";

impl StateStore {
    fn set_meta(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO meta (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )?;
            Ok(())
        })
    }

    fn meta(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row("SELECT value FROM meta WHERE key = ?1", params![key], |row| {
                    row.get(0)
                })
                .optional()?)
        })
    }

    fn clear_meta(&self, key: &str) -> Result<(), StorageError> {
        self.with_tx(|tx| {
            tx.execute("DELETE FROM meta WHERE key = ?1", params![key])?;
            Ok(())
        })
    }

    fn meta_ts(&self, key: &str) -> Result<Option<DateTime<Utc>>, StorageError> {
        Ok(self.meta(key)?.and_then(|raw| parse_ts(&raw, "meta")))
    }

    /// Replace the cached repo list used when GitHub is rate limiting.
    pub fn replace_cached_repos(&self, repos: &[RepoRef]) -> Result<(), StorageError> {
        self.with_tx(|tx| {
            tx.execute("DELETE FROM repos", [])?;
            for repo in repos {
                tx.execute(
                    "INSERT OR IGNORE INTO repos (owner, name) VALUES (?1, ?2)",
                    params![repo.owner, repo.name],
                )?;
            }
            Ok(())
        })
    }

    pub fn cached_repos(&self) -> Result<Vec<RepoRef>, StorageError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT owner, name FROM repos ORDER BY owner, name")?;
            let rows = stmt.query_map([], |row| {
                Ok(RepoRef::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            rows.collect::<Result<Vec<_>, _>>().map_err(StorageError::from)
        })
    }

    pub fn webhook_catchup_last_run(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        self.meta_ts(KEY_WEBHOOK_CATCHUP)
    }

    pub fn set_webhook_catchup_last_run(&self, at: DateTime<Utc>) -> Result<(), StorageError> {
        self.set_meta(KEY_WEBHOOK_CATCHUP, &ts(at))
    }

    pub fn rate_limited_until(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        self.meta_ts(KEY_RATE_LIMITED_UNTIL)
    }

    pub fn set_rate_limited_until(
        &self,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), StorageError> {
        match until {
            Some(at) => self.set_meta(KEY_RATE_LIMITED_UNTIL, &ts(at)),
            None => self.clear_meta(KEY_RATE_LIMITED_UNTIL),
        }
    }

    /// Increment today's Amazon Q request counter; returns the new count.
    pub fn increment_amazon_q_usage(
        &self,
        day_start: DateTime<Utc>,
    ) -> Result<u32, StorageError> {
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO amazon_q_usage (day_start, count) VALUES (?1, 1)
                 ON CONFLICT(day_start) DO UPDATE SET count = count + 1",
                params![ts(day_start)],
            )?;
            let count = tx.query_row(
                "SELECT count FROM amazon_q_usage WHERE day_start = ?1",
                params![ts(day_start)],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    pub fn amazon_q_usage(&self, day_start: DateTime<Utc>) -> Result<u32, StorageError> {
        self.with_conn(|conn| {
            let count = conn
                .query_row(
                    "SELECT count FROM amazon_q_usage WHERE day_start = ?1",
                    params![ts(day_start)],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(count.unwrap_or(0))
        })
    }

    pub fn gemini_warmup_last_attempt(
        &self,
        model: &str,
    ) -> Result<Option<DateTime<Utc>>, StorageError> {
        self.with_conn(|conn| {
            let raw: Option<String> = conn
                .query_row(
                    "SELECT last_attempt_at FROM gemini_warmup WHERE model = ?1",
                    params![model],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(raw.and_then(|raw| parse_ts(&raw, "gemini_warmup")))
        })
    }

    pub fn record_gemini_warmup(
        &self,
        model: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO gemini_warmup (model, last_attempt_at) VALUES (?1, ?2)
                 ON CONFLICT(model) DO UPDATE SET last_attempt_at = excluded.last_attempt_at",
                params![model, ts(at)],
            )?;
            Ok(())
        })
    }
}
