// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Codex engine adapter.
//!
//! Quota comes from the rate-limit entries Codex writes into its local
//! session JSONL files; when none are recent enough, we fall back to the
//! backend usage endpoint authenticated with the locally persisted OAuth
//! access token.

use crate::error::EngineError;
use crate::{Engine, Invocation, TaskSpec, UsageContext};
use ar_core::{EngineKind, RawWindow, UsageStatus};
use async_trait::async_trait;
use chrono::Duration;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const SESSIONS_DIR: &str = ".codex/sessions";
const AUTH_FILE: &str = ".codex/auth.json";
const USAGE_URL: &str = "https://chatgpt.com/backend-api/wham/usage";
/// Only session files touched within this many days are consulted.
const SESSION_SCAN_DAYS: u64 = 7;

pub struct CodexEngine;

#[derive(Debug, Deserialize)]
struct RateLimitWindowWire {
    used_percent: f64,
    #[serde(default)]
    window_minutes: Option<i64>,
    #[serde(default)]
    resets_in_seconds: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RateLimitsWire {
    #[serde(default)]
    primary: Option<RateLimitWindowWire>,
    #[serde(default)]
    secondary: Option<RateLimitWindowWire>,
}

#[derive(Debug, Deserialize)]
struct AuthFileWire {
    #[serde(default)]
    tokens: Option<AuthTokensWire>,
}

#[derive(Debug, Deserialize)]
struct AuthTokensWire {
    access_token: String,
}

/// Parse the `rate_limits` object out of one JSONL line, if present.
fn rate_limits_in_line(line: &str) -> Option<RateLimitsWire> {
    if !line.contains("rate_limits") {
        return None;
    }
    let value: serde_json::Value = serde_json::from_str(line).ok()?;
    let limits = value
        .pointer("/payload/rate_limits")
        .or_else(|| value.pointer("/rate_limits"))?;
    serde_json::from_value(limits.clone()).ok()
}

fn windows_from_limits(ctx: &UsageContext, limits: RateLimitsWire) -> UsageStatus {
    let raw = |w: RateLimitWindowWire| RawWindow {
        used_percent: w.used_percent,
        resets_at: w.resets_in_seconds.map(|s| ctx.now + Duration::seconds(s)),
        duration: w.window_minutes.map(Duration::minutes),
    };
    let mut windows = Vec::new();
    if let Some(primary) = limits.primary {
        windows.push(raw(primary));
    }
    if let Some(secondary) = limits.secondary {
        windows.push(raw(secondary));
    }
    UsageStatus::normalize(ctx.now, windows)
}

/// Collect session JSONL files under `root`, newest first, skipping any
/// not modified within the scan window.
fn recent_session_files(root: &Path) -> Vec<(std::time::SystemTime, PathBuf)> {
    let mut files = Vec::new();
    let cutoff = std::time::SystemTime::now()
        - std::time::Duration::from_secs(SESSION_SCAN_DAYS * 24 * 3600);
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else { continue };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().and_then(|e| e.to_str()) == Some("jsonl") {
                if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
                    if modified >= cutoff {
                        files.push((modified, path));
                    }
                }
            }
        }
    }
    files.sort_by(|a, b| b.0.cmp(&a.0));
    files
}

/// Scan recent session files for the freshest rate-limit entry.
fn usage_from_sessions(ctx: &UsageContext) -> Option<UsageStatus> {
    for (_, path) in recent_session_files(&ctx.home.join(SESSIONS_DIR)) {
        let Ok(text) = std::fs::read_to_string(&path) else { continue };
        if let Some(limits) = text.lines().rev().find_map(rate_limits_in_line) {
            tracing::debug!(file = %path.display(), "codex rate limits from session log");
            return Some(windows_from_limits(ctx, limits));
        }
    }
    None
}

async fn usage_from_backend(ctx: &UsageContext) -> Result<UsageStatus, EngineError> {
    let auth_path = ctx.home.join(AUTH_FILE);
    let text = std::fs::read_to_string(&auth_path).map_err(|e| EngineError::NoCredentials {
        engine: "codex",
        detail: format!("cannot read {}: {e}", auth_path.display()),
    })?;
    let auth: AuthFileWire =
        serde_json::from_str(&text).map_err(|e| EngineError::NoCredentials {
            engine: "codex",
            detail: format!("malformed auth.json: {e}"),
        })?;
    let token = auth.tokens.map(|t| t.access_token).ok_or(EngineError::NoCredentials {
        engine: "codex",
        detail: "auth.json has no access token".to_string(),
    })?;

    let response = ctx
        .http
        .get(USAGE_URL)
        .bearer_auth(token)
        .timeout(ctx.timeout)
        .send()
        .await?
        .error_for_status()?;
    let body: serde_json::Value = response.json().await?;
    let limits = body
        .pointer("/rate_limits")
        .cloned()
        .ok_or(EngineError::Parse {
            engine: "codex",
            detail: "usage payload has no rate_limits".to_string(),
        })?;
    let limits: RateLimitsWire =
        serde_json::from_value(limits).map_err(|e| EngineError::Parse {
            engine: "codex",
            detail: e.to_string(),
        })?;
    Ok(windows_from_limits(ctx, limits))
}

#[async_trait]
impl Engine for CodexEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Codex
    }

    async fn usage(&self, ctx: &UsageContext) -> Result<UsageStatus, EngineError> {
        if let Some(status) = usage_from_sessions(ctx) {
            return Ok(status);
        }
        usage_from_backend(ctx).await
    }

    fn build_invocation(&self, task: &TaskSpec) -> Invocation {
        let mut args = vec!["exec".to_string()];
        if let Some(session) = &task.resume_session {
            args.push("resume".to_string());
            args.push(session.clone());
        }
        args.push("--full-auto".to_string());
        args.push("--skip-git-repo-check".to_string());
        args.push(task.prompt.clone());
        Invocation { program: "codex".to_string(), args, env: Vec::new(), stdin: None }
    }
}

#[cfg(test)]
#[path = "codex_tests.rs"]
mod tests;
