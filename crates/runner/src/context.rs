// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Shared cycle context: config, store, GitHub client, limiter.
//!
//! Interface-typed collaborators held by composition; dispatch tasks get
//! a cheap clone.

use ar_core::RunnerConfig;
use ar_github::GithubClient;
use ar_storage::StateStore;
use std::sync::Arc;

use crate::limiter::ConcurrencyGate;

#[derive(Clone)]
pub struct RunnerCtx {
    pub config: Arc<RunnerConfig>,
    pub store: Arc<StateStore>,
    pub gh: Arc<GithubClient>,
    pub gate: ConcurrencyGate,
    /// Shared HTTP client for engine quota reads.
    pub http: reqwest::Client,
}

impl RunnerCtx {
    pub fn new(config: RunnerConfig, store: StateStore, gh: GithubClient) -> Self {
        let gate = ConcurrencyGate::new(
            config.scheduler.concurrency,
            &config.scheduler.service_limits,
        );
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
            gh: Arc::new(gh),
            gate,
            http: reqwest::Client::new(),
        }
    }
}
