// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Retention sweeps for run logs and idle reports.

use chrono::{DateTime, Duration, Utc};
use std::path::{Path, PathBuf};

/// Delete (or, in dry-run, just list) files in `dir` whose mtime is older
/// than `days`. Returns the affected paths.
pub fn prune_older_than(
    dir: &Path,
    days: i64,
    now: DateTime<Utc>,
    dry_run: bool,
) -> std::io::Result<Vec<PathBuf>> {
    let cutoff = now - Duration::days(days);
    let mut affected = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(affected),
        Err(e) => return Err(e),
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
            continue;
        };
        let modified: DateTime<Utc> = modified.into();
        if modified < cutoff {
            if !dry_run {
                if let Err(e) = std::fs::remove_file(&path) {
                    tracing::warn!(path = %path.display(), error = %e, "cannot prune file");
                    continue;
                }
            }
            affected.push(path);
        }
    }
    affected.sort();
    Ok(affected)
}

#[cfg(test)]
#[path = "prune_tests.rs"]
mod tests;
