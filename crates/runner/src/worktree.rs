// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Worktree manager: bare caches and per-run isolated checkouts.
//!
//! Layout under the workdir root:
//! - `<repo>` — canonical local clone, source for the cache
//! - `agent-runner/git-cache/<owner>/<name>.git` — bare mirror
//! - `agent-runner/work/<run_id>/<owner>--<name>` — per-run checkout
//!
//! All operations on one repo's cache are serialized by its file lock.

use ar_core::{RepoRef, RunId, RunnerConfig};
use ar_storage::RepoCacheLock;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::process::{run_with_timeout, SubprocessError};

/// Pre-push hook installed into every worktree. Blocks pushes to the
/// protected default branches; everything else passes through.
pub const PRE_PUSH_HOOK: &str = r#"#!/bin/sh
# Installed by agent-runner. Engines must publish to work branches only.
while read local_ref local_sha remote_ref remote_sha; do
    case "$remote_ref" in
        refs/heads/main|refs/heads/master)
            echo "agent-runner: push to $remote_ref is blocked" >&2
            exit 1
            ;;
    esac
done
exit 0
"#;

#[derive(Debug, thiserror::Error)]
pub enum WorktreeError {
    #[error("git {what} failed: {stderr}")]
    Git { what: String, stderr: String },

    #[error(transparent)]
    Subprocess(#[from] SubprocessError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Lock(#[from] ar_storage::StorageError),

    #[error("branch {branch} is checked out by a live run at {path}: {owner}")]
    BranchBusy { branch: String, path: PathBuf, owner: String },

    #[error("cannot resolve default branch for {repo}")]
    NoDefaultBranch { repo: String },
}

/// Liveness of whatever owns an existing worktree, as judged from the
/// running records.
#[derive(Debug, Clone)]
pub enum OwnerLiveness {
    Live { description: String },
    /// Record exists but its pid is dead, or there is no record at all.
    Dead,
}

/// One entry of `git worktree list --porcelain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeInfo {
    pub path: PathBuf,
    pub head: Option<String>,
    /// Full ref, e.g. `refs/heads/fix/x`. Absent for detached or bare.
    pub branch: Option<String>,
}

/// Parse `git worktree list --porcelain` output.
pub fn parse_worktree_list(porcelain: &str) -> Vec<WorktreeInfo> {
    let mut entries = Vec::new();
    let mut current: Option<WorktreeInfo> = None;
    for line in porcelain.lines() {
        if let Some(path) = line.strip_prefix("worktree ") {
            if let Some(done) = current.take() {
                entries.push(done);
            }
            current = Some(WorktreeInfo {
                path: PathBuf::from(path),
                head: None,
                branch: None,
            });
        } else if let Some(head) = line.strip_prefix("HEAD ") {
            if let Some(info) = current.as_mut() {
                info.head = Some(head.to_string());
            }
        } else if let Some(branch) = line.strip_prefix("branch ") {
            if let Some(info) = current.as_mut() {
                info.branch = Some(branch.to_string());
            }
        }
    }
    if let Some(done) = current.take() {
        entries.push(done);
    }
    entries
}

/// What to do about one conflicting worktree entry.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ConflictAction {
    /// Evict: remove the worktree, then proceed.
    Remove,
    /// The path is already gone; a prune suffices.
    Prune,
    /// A live owner holds it; fail the dispatch with this message.
    Fail(String),
}

/// Decide how to resolve a conflicting checkout of the requested branch.
pub(crate) fn resolve_conflict(
    entry: &WorktreeInfo,
    target: &Path,
    liveness: &dyn Fn(&Path) -> OwnerLiveness,
) -> ConflictAction {
    if entry.path == target {
        return ConflictAction::Remove;
    }
    if !entry.path.exists() {
        return ConflictAction::Prune;
    }
    match liveness(&entry.path) {
        OwnerLiveness::Dead => ConflictAction::Remove,
        OwnerLiveness::Live { description } => ConflictAction::Fail(format!(
            "worktree {} is held by {description}",
            entry.path.display()
        )),
    }
}

/// A created checkout.
#[derive(Debug, Clone)]
pub struct Worktree {
    pub path: PathBuf,
    pub branch: String,
}

pub struct WorktreeManager {
    workdir_root: PathBuf,
    git_timeout: Duration,
    lock_timeout: Duration,
}

impl WorktreeManager {
    pub fn new(config: &RunnerConfig) -> Self {
        Self {
            workdir_root: config.workdir_root.clone(),
            git_timeout: Duration::from_secs(config.timeouts.git_secs),
            lock_timeout: Duration::from_secs(config.timeouts.cache_lock_minutes * 60),
        }
    }

    fn clone_dir(&self, repo: &RepoRef) -> PathBuf {
        self.workdir_root.join(&repo.name)
    }

    fn cache_dir(&self, repo: &RepoRef) -> PathBuf {
        self.workdir_root
            .join("agent-runner/git-cache")
            .join(&repo.owner)
            .join(format!("{}.git", repo.name))
    }

    fn locks_dir(&self) -> PathBuf {
        self.workdir_root.join("agent-runner/state/locks")
    }

    pub fn work_path(&self, run_id: &RunId, repo: &RepoRef) -> PathBuf {
        self.workdir_root
            .join("agent-runner/work")
            .join(run_id.as_str())
            .join(repo.slug())
    }

    /// Deterministic fresh-run branch name.
    pub fn run_branch(kind: &str, now: DateTime<Utc>, run_id: &RunId) -> String {
        format!(
            "agent-runner/{kind}-{}-{}",
            now.format("%Y%m%d-%H%M%S"),
            &run_id.suffix()[..6.min(run_id.suffix().len())]
        )
    }

    async fn lock(&self, repo: &RepoRef) -> Result<RepoCacheLock, WorktreeError> {
        let locks_dir = self.locks_dir();
        let key = repo.key();
        let timeout = self.lock_timeout;
        let lock = tokio::task::spawn_blocking(move || {
            RepoCacheLock::acquire(&locks_dir, &key, timeout)
        })
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))??;
        Ok(lock)
    }

    /// Run git with scrubbed worktree env; non-zero exit is an error
    /// carrying trimmed stderr.
    async fn git(&self, args: &[String], what: &str) -> Result<String, WorktreeError> {
        let mut cmd = tokio::process::Command::new("git");
        cmd.args(args).env_remove("GIT_DIR").env_remove("GIT_WORK_TREE");
        let output = run_with_timeout(cmd, self.git_timeout, what).await?;
        if !output.status.success() {
            return Err(WorktreeError::Git {
                what: what.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn cache_args(&self, repo: &RepoRef, rest: &[&str]) -> Vec<String> {
        let mut args = vec!["-C".to_string(), self.cache_dir(repo).display().to_string()];
        args.extend(rest.iter().map(|s| s.to_string()));
        args
    }

    /// Make sure the bare cache exists, cloning the canonical repo first
    /// when needed.
    pub async fn ensure_cache(&self, repo: &RepoRef) -> Result<(), WorktreeError> {
        let _lock = self.lock(repo).await?;
        let cache = self.cache_dir(repo);
        if cache.exists() {
            return Ok(());
        }
        if let Some(parent) = cache.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let clone = self.clone_dir(repo);
        if !clone.exists() {
            // Prefer gh (it reuses the user's auth); fall back to git.
            let mut gh = tokio::process::Command::new("gh");
            gh.args(["repo", "clone", &repo.to_string(), &clone.display().to_string()]);
            let gh_result = run_with_timeout(gh, self.git_timeout, "gh repo clone").await;
            let cloned = matches!(&gh_result, Ok(output) if output.status.success());
            if !cloned {
                self.git(
                    &[
                        "clone".to_string(),
                        "--recursive".to_string(),
                        repo.https_url(),
                        clone.display().to_string(),
                    ],
                    "git clone",
                )
                .await?;
            }
        }

        self.git(
            &[
                "clone".to_string(),
                "--bare".to_string(),
                clone.display().to_string(),
                cache.display().to_string(),
            ],
            "git clone --bare",
        )
        .await?;
        self.git(
            &self.cache_args(repo, &["remote", "set-url", "origin", &repo.https_url()]),
            "git remote set-url",
        )
        .await?;
        Ok(())
    }

    /// Fetch everything and drop stale worktree registrations.
    pub async fn refresh_cache(&self, repo: &RepoRef) -> Result<(), WorktreeError> {
        let _lock = self.lock(repo).await?;
        self.git(
            &self.cache_args(repo, &["fetch", "--prune", "--tags", "origin"]),
            "git fetch",
        )
        .await?;
        self.git(&self.cache_args(repo, &["worktree", "prune"]), "git worktree prune").await?;
        Ok(())
    }

    /// Resolve the remote default branch via the cache's origin HEAD.
    pub async fn default_branch(&self, repo: &RepoRef) -> Result<String, WorktreeError> {
        let output = self
            .git(
                &self.cache_args(repo, &["ls-remote", "--symref", "origin", "HEAD"]),
                "git ls-remote --symref",
            )
            .await?;
        for line in output.lines() {
            // "ref: refs/heads/main\tHEAD"
            if let Some(rest) = line.strip_prefix("ref: refs/heads/") {
                if let Some(branch) = rest.split_whitespace().next() {
                    return Ok(branch.to_string());
                }
            }
        }
        Err(WorktreeError::NoDefaultBranch { repo: repo.to_string() })
    }

    /// Fresh-issue/idle checkout: a new branch off the default branch.
    pub async fn create_for_default_branch(
        &self,
        repo: &RepoRef,
        run_id: &RunId,
        kind: &str,
        now: DateTime<Utc>,
    ) -> Result<Worktree, WorktreeError> {
        let default = self.default_branch(repo).await?;
        let branch = Self::run_branch(kind, now, run_id);
        let path = self.work_path(run_id, repo);

        let _lock = self.lock(repo).await?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.git(
            &self.cache_args(
                repo,
                &[
                    "worktree",
                    "add",
                    "-b",
                    &branch,
                    &path.display().to_string(),
                    &format!("origin/{default}"),
                ],
            ),
            "git worktree add",
        )
        .await?;
        self.finish_checkout(&path).await?;
        Ok(Worktree { path, branch })
    }

    /// Managed-PR checkout: track the PR head branch, evicting stale
    /// conflicting worktrees first.
    pub async fn create_for_remote_branch(
        &self,
        repo: &RepoRef,
        run_id: &RunId,
        branch: &str,
        liveness: &(dyn Fn(&Path) -> OwnerLiveness + Send + Sync),
    ) -> Result<Worktree, WorktreeError> {
        let path = self.work_path(run_id, repo);
        let _lock = self.lock(repo).await?;

        self.git(
            &self.cache_args(
                repo,
                &["fetch", "origin", &format!("+refs/heads/{branch}:refs/remotes/origin/{branch}")],
            ),
            "git fetch branch",
        )
        .await?;

        let listing = self
            .git(&self.cache_args(repo, &["worktree", "list", "--porcelain"]), "git worktree list")
            .await?;
        let wanted_ref = format!("refs/heads/{branch}");
        for entry in parse_worktree_list(&listing) {
            if entry.branch.as_deref() != Some(wanted_ref.as_str()) {
                continue;
            }
            match resolve_conflict(&entry, &path, liveness) {
                ConflictAction::Remove => {
                    tracing::info!(
                        repo = %repo,
                        path = %entry.path.display(),
                        branch,
                        "evicting stale worktree holding requested branch"
                    );
                    self.remove_locked(repo, &entry.path).await?;
                }
                ConflictAction::Prune => {
                    self.git(&self.cache_args(repo, &["worktree", "prune"]), "git worktree prune")
                        .await?;
                }
                ConflictAction::Fail(owner) => {
                    return Err(WorktreeError::BranchBusy {
                        branch: branch.to_string(),
                        path: entry.path.clone(),
                        owner,
                    });
                }
            }
        }

        self.git(
            &self.cache_args(repo, &["branch", "-f", branch, &format!("refs/remotes/origin/{branch}")]),
            "git branch -f",
        )
        .await?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.git(
            &self.cache_args(repo, &["worktree", "add", &path.display().to_string(), branch]),
            "git worktree add",
        )
        .await?;
        self.finish_checkout(&path).await?;
        Ok(Worktree { path, branch: branch.to_string() })
    }

    /// Remove a per-run worktree: unregister, then best-effort delete.
    pub async fn remove(&self, repo: &RepoRef, path: &Path) -> Result<(), WorktreeError> {
        let _lock = self.lock(repo).await?;
        self.remove_locked(repo, path).await
    }

    async fn remove_locked(&self, repo: &RepoRef, path: &Path) -> Result<(), WorktreeError> {
        let result = self
            .git(
                &self.cache_args(
                    repo,
                    &["worktree", "remove", "--force", &path.display().to_string()],
                ),
                "git worktree remove",
            )
            .await;
        if let Err(e) = result {
            tracing::debug!(path = %path.display(), error = %e, "worktree remove, continuing");
        }
        if path.exists() {
            let _ = std::fs::remove_dir_all(path);
        }
        // Also drop the run directory when it is now empty.
        if let Some(parent) = path.parent() {
            let _ = std::fs::remove_dir(parent);
        }
        Ok(())
    }

    /// Hook installation plus submodule init for a fresh checkout.
    async fn finish_checkout(&self, worktree: &Path) -> Result<(), WorktreeError> {
        self.install_pre_push_hook(worktree).await?;
        if worktree.join(".gitmodules").exists() {
            self.git(
                &[
                    "-C".to_string(),
                    worktree.display().to_string(),
                    "submodule".to_string(),
                    "update".to_string(),
                    "--init".to_string(),
                    "--recursive".to_string(),
                ],
                "git submodule update",
            )
            .await?;
        }
        Ok(())
    }

    async fn install_pre_push_hook(&self, worktree: &Path) -> Result<(), WorktreeError> {
        let hooks_raw = self
            .git(
                &[
                    "-C".to_string(),
                    worktree.display().to_string(),
                    "rev-parse".to_string(),
                    "--git-path".to_string(),
                    "hooks".to_string(),
                ],
                "git rev-parse --git-path",
            )
            .await?;
        let hooks_rel = PathBuf::from(hooks_raw.trim());
        let hooks_dir = if hooks_rel.is_absolute() {
            hooks_rel
        } else {
            worktree.join(hooks_rel)
        };
        std::fs::create_dir_all(&hooks_dir)?;
        let hook_path = hooks_dir.join("pre-push");
        std::fs::write(&hook_path, PRE_PUSH_HOOK)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&hook_path, std::fs::Permissions::from_mode(0o755))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "worktree_tests.rs"]
mod tests;
