// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ar-engines: Engine adapters for the agent-runner scheduler
//!
//! One [`Engine`] per CLI backend: quota reads mapped into the generic
//! `(short, long)` usage windows, and invocation builders with explicit
//! argument arrays (never a shell string, so issue titles and task text
//! cannot be reinterpreted).

pub mod amazon_q;
pub mod claude;
pub mod codex;
pub mod copilot;
mod error;
pub mod gemini;
pub mod session;

use ar_core::{EngineKind, UsageStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;

pub use error::EngineError;
pub use session::extract_session_id;

/// What an engine process should be started with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub stdin: Option<String>,
}

/// One unit of work handed to an engine.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub prompt: String,
    /// Resume this engine session instead of starting fresh.
    pub resume_session: Option<String>,
}

impl TaskSpec {
    pub fn fresh(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), resume_session: None }
    }

    pub fn resume(prompt: impl Into<String>, session: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), resume_session: Some(session.into()) }
    }
}

/// Shared inputs for quota reads.
pub struct UsageContext {
    pub http: reqwest::Client,
    /// User home, for locally persisted credentials and session logs.
    pub home: PathBuf,
    pub now: DateTime<Utc>,
    pub timeout: Duration,
    /// Amazon Q has no queryable backend; the runner feeds it the local
    /// day counter and the configured cap.
    pub amazon_q_used_today: u32,
    pub amazon_q_daily_cap: u32,
}

impl UsageContext {
    pub fn new(now: DateTime<Utc>, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            home: dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")),
            now,
            timeout,
            amazon_q_used_today: 0,
            amazon_q_daily_cap: 0,
        }
    }
}

/// Engine capability: quota, invocation, identity.
#[async_trait]
pub trait Engine: Send + Sync {
    fn kind(&self) -> EngineKind;

    /// Read the backend quota and normalize it. A fetch or parse failure
    /// is an error — the caller denies this engine for the cycle only.
    async fn usage(&self, ctx: &UsageContext) -> Result<UsageStatus, EngineError>;

    /// Build the child invocation for a task, honoring resume mode.
    fn build_invocation(&self, task: &TaskSpec) -> Invocation;
}

/// Construct the adapter for an engine kind.
pub fn engine_for(kind: EngineKind) -> Box<dyn Engine> {
    match kind {
        EngineKind::Codex => Box::new(codex::CodexEngine),
        EngineKind::Copilot => Box::new(copilot::CopilotEngine),
        EngineKind::GeminiPro => Box::new(gemini::GeminiEngine::pro()),
        EngineKind::GeminiFlash => Box::new(gemini::GeminiEngine::flash()),
        EngineKind::AmazonQ => Box::new(amazon_q::AmazonQEngine),
        EngineKind::Claude => Box::new(claude::ClaudeEngine),
    }
}

/// `AGENT_RUNNER_USAGE_TIMING=1` turns on per-read timing logs.
pub fn usage_timing_enabled() -> bool {
    std::env::var("AGENT_RUNNER_USAGE_TIMING").map(|v| v == "1").unwrap_or(false)
}

/// Run a quota read, emitting a timing log when enabled.
pub async fn timed_usage(
    engine: &dyn Engine,
    ctx: &UsageContext,
) -> Result<UsageStatus, EngineError> {
    let started = std::time::Instant::now();
    let result = engine.usage(ctx).await;
    if usage_timing_enabled() {
        tracing::info!(
            engine = %engine.kind(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "usage read"
        );
    }
    result
}
