// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Claude engine adapter.
//!
//! Quota comes from the OAuth usage endpoint, authenticated with the
//! token the Claude CLI persists locally.

use crate::error::EngineError;
use crate::{Engine, Invocation, TaskSpec, UsageContext};
use ar_core::{EngineKind, RawWindow, UsageStatus};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

const CREDENTIALS_FILE: &str = ".claude/.credentials.json";
const USAGE_URL: &str = "https://api.anthropic.com/api/oauth/usage";

pub struct ClaudeEngine;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsWire {
    claude_ai_oauth: OauthWire,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OauthWire {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UsageWindowWire {
    /// Consumed fraction of the window, 0–100.
    utilization: f64,
    #[serde(default)]
    resets_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct UsagePayloadWire {
    #[serde(default)]
    five_hour: Option<UsageWindowWire>,
    #[serde(default)]
    seven_day: Option<UsageWindowWire>,
}

fn windows_from_payload(ctx: &UsageContext, payload: UsagePayloadWire) -> UsageStatus {
    let mut windows = Vec::new();
    if let Some(five_hour) = payload.five_hour {
        windows.push(RawWindow {
            used_percent: five_hour.utilization,
            resets_at: five_hour.resets_at,
            duration: Some(Duration::hours(5)),
        });
    }
    if let Some(seven_day) = payload.seven_day {
        windows.push(RawWindow {
            used_percent: seven_day.utilization,
            resets_at: seven_day.resets_at,
            duration: Some(Duration::days(7)),
        });
    }
    UsageStatus::normalize(ctx.now, windows)
}

#[async_trait]
impl Engine for ClaudeEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Claude
    }

    async fn usage(&self, ctx: &UsageContext) -> Result<UsageStatus, EngineError> {
        let path = ctx.home.join(CREDENTIALS_FILE);
        let text = std::fs::read_to_string(&path).map_err(|e| EngineError::NoCredentials {
            engine: "claude",
            detail: format!("cannot read {}: {e}", path.display()),
        })?;
        let creds: CredentialsWire =
            serde_json::from_str(&text).map_err(|e| EngineError::NoCredentials {
                engine: "claude",
                detail: format!("malformed credentials: {e}"),
            })?;

        let response = ctx
            .http
            .get(USAGE_URL)
            .bearer_auth(creds.claude_ai_oauth.access_token)
            .header("anthropic-beta", "oauth-2025-04-20")
            .timeout(ctx.timeout)
            .send()
            .await?
            .error_for_status()?;
        let payload: UsagePayloadWire = response.json().await?;
        Ok(windows_from_payload(ctx, payload))
    }

    fn build_invocation(&self, task: &TaskSpec) -> Invocation {
        let mut args = vec![
            "-p".to_string(),
            task.prompt.clone(),
            "--output-format".to_string(),
            "json".to_string(),
            "--permission-mode".to_string(),
            "acceptEdits".to_string(),
        ];
        if let Some(session) = &task.resume_session {
            args.push("--resume".to_string());
            args.push(session.clone());
        }
        Invocation { program: "claude".to_string(), args, env: Vec::new(), stdin: None }
    }
}

#[cfg(test)]
#[path = "claude_tests.rs"]
mod tests;
