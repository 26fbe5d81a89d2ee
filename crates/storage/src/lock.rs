// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Advisory file locks
//!
//! Two locks guard shared resources: the process-wide runner singleton at
//! `state/runner.lock`, and one lock per repo git-cache under
//! `state/locks/`. Both rely on OS advisory locking, so a lock held by a
//! crashed process is released automatically; the pid written into the
//! lock file is informational (stale-pid reclaim is just a successful
//! acquire over a leftover file).

use crate::error::StorageError;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const RUNNER_LOCK_FILE: &str = "runner.lock";

/// The single-writer lock preventing concurrent driver instances.
///
/// Held for the whole lifetime of the `run` command; released on drop.
pub struct RunnerLock {
    file: File,
    path: PathBuf,
}

impl RunnerLock {
    /// Try to acquire the singleton. `Ok(None)` means another live driver
    /// holds it.
    pub fn acquire(state_dir: &Path) -> Result<Option<RunnerLock>, StorageError> {
        std::fs::create_dir_all(state_dir)?;
        let path = state_dir.join(RUNNER_LOCK_FILE);
        let mut file =
            OpenOptions::new().read(true).write(true).create(true).truncate(false).open(&path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                file.set_len(0)?;
                file.seek(SeekFrom::Start(0))?;
                write!(file, "{}", std::process::id())?;
                file.flush()?;
                tracing::debug!(path = %path.display(), "acquired runner lock");
                Ok(Some(RunnerLock { file, path }))
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                let holder = read_pid(&mut file);
                tracing::info!(
                    path = %path.display(),
                    holder_pid = holder,
                    "runner lock held by another process"
                );
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunnerLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

fn read_pid(file: &mut File) -> Option<u32> {
    let mut buf = String::new();
    file.seek(SeekFrom::Start(0)).ok()?;
    file.read_to_string(&mut buf).ok()?;
    buf.trim().parse().ok()
}

/// Per-repo git-cache lock serializing worktree operations on one cache.
pub struct RepoCacheLock {
    file: File,
    path: PathBuf,
}

impl RepoCacheLock {
    /// Acquire the lock for `repo_key` (lowercased `owner/name`), waiting
    /// up to `timeout`. Blocking; call from `spawn_blocking` in async
    /// contexts.
    pub fn acquire(
        locks_dir: &Path,
        repo_key: &str,
        timeout: Duration,
    ) -> Result<RepoCacheLock, StorageError> {
        std::fs::create_dir_all(locks_dir)?;
        let path = locks_dir.join(format!("{}.lock", repo_key.replace('/', "--")));
        let file =
            OpenOptions::new().read(true).write(true).create(true).truncate(false).open(&path)?;

        let deadline = Instant::now() + timeout;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "acquired repo cache lock");
                    return Ok(RepoCacheLock { file, path });
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        return Err(StorageError::LockTimeout { path });
                    }
                    std::thread::sleep(Duration::from_millis(500));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RepoCacheLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
