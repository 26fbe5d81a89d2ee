// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Runner error umbrella

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error(transparent)]
    Storage(#[from] ar_storage::StorageError),

    #[error(transparent)]
    Github(#[from] ar_github::GithubError),

    #[error(transparent)]
    Engine(#[from] ar_engines::EngineError),

    #[error(transparent)]
    Worktree(#[from] crate::worktree::WorktreeError),

    #[error(transparent)]
    Exec(#[from] crate::exec::ExecError),

    #[error(transparent)]
    Config(#[from] ar_core::config::ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
