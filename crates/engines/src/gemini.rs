// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Gemini engine adapter (Pro and Flash variants).
//!
//! Quota comes from the Code Assist backend, authenticated with the OAuth
//! credentials the Gemini CLI persists locally; an expired access token is
//! refreshed with the standard token endpoint. The OAuth client id/secret
//! default to the CLI's public installed-app client and can be overridden
//! via `GEMINI_OAUTH_CLIENT_ID` / `GEMINI_OAUTH_CLIENT_SECRET`.

use crate::error::EngineError;
use crate::{Engine, Invocation, TaskSpec, UsageContext};
use ar_core::{EngineKind, RawWindow, UsageStatus};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

const CREDENTIALS_FILE: &str = ".gemini/oauth_creds.json";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const LOAD_URL: &str = "https://cloudcode-pa.googleapis.com/v1internal:loadCodeAssist";

const DEFAULT_CLIENT_ID: &str =
    "681255809395-oo8ft2oprdrnp9e3aqf6av3hmdib135j.apps.googleusercontent.com";
const DEFAULT_CLIENT_SECRET: &str = "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";

pub const MODEL_PRO: &str = "gemini-2.5-pro";
pub const MODEL_FLASH: &str = "gemini-2.5-flash";

pub struct GeminiEngine {
    kind: EngineKind,
    model: &'static str,
}

impl GeminiEngine {
    pub fn pro() -> Self {
        Self { kind: EngineKind::GeminiPro, model: MODEL_PRO }
    }

    pub fn flash() -> Self {
        Self { kind: EngineKind::GeminiFlash, model: MODEL_FLASH }
    }

    pub fn model(&self) -> &'static str {
        self.model
    }
}

fn oauth_client_id() -> String {
    std::env::var("GEMINI_OAUTH_CLIENT_ID").unwrap_or_else(|_| DEFAULT_CLIENT_ID.to_string())
}

fn oauth_client_secret() -> String {
    std::env::var("GEMINI_OAUTH_CLIENT_SECRET")
        .unwrap_or_else(|_| DEFAULT_CLIENT_SECRET.to_string())
}

#[derive(Debug, Deserialize)]
struct CredsWire {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    /// Epoch milliseconds.
    #[serde(default)]
    expiry_date: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RefreshWire {
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelUsageWire {
    model: String,
    /// Remaining fraction of the daily quota, 0–1.
    #[serde(default)]
    remaining_fraction: Option<f64>,
    #[serde(default)]
    reset_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadPayloadWire {
    #[serde(default)]
    usage_snapshot: Option<UsageSnapshotWire>,
}

#[derive(Debug, Deserialize)]
struct UsageSnapshotWire {
    #[serde(default)]
    models: Vec<ModelUsageWire>,
}

fn windows_for_model(
    ctx: &UsageContext,
    payload: &LoadPayloadWire,
    model: &str,
) -> UsageStatus {
    let Some(snapshot) = &payload.usage_snapshot else {
        return UsageStatus::default();
    };
    let Some(usage) = snapshot.models.iter().find(|m| m.model == model) else {
        return UsageStatus::default();
    };
    let remaining = usage.remaining_fraction.unwrap_or(0.0).clamp(0.0, 1.0);
    UsageStatus::normalize(
        ctx.now,
        vec![RawWindow {
            used_percent: (1.0 - remaining) * 100.0,
            resets_at: usage.reset_time,
            duration: Some(Duration::hours(24)),
        }],
    )
}

async fn access_token(ctx: &UsageContext) -> Result<String, EngineError> {
    let path = ctx.home.join(CREDENTIALS_FILE);
    let text = std::fs::read_to_string(&path).map_err(|e| EngineError::NoCredentials {
        engine: "gemini",
        detail: format!("cannot read {}: {e}", path.display()),
    })?;
    let creds: CredsWire = serde_json::from_str(&text).map_err(|e| EngineError::NoCredentials {
        engine: "gemini",
        detail: format!("malformed oauth_creds.json: {e}"),
    })?;

    let expired = creds
        .expiry_date
        .map(|ms| ms <= ctx.now.timestamp_millis() + 60_000)
        .unwrap_or(true);
    if let (false, Some(token)) = (expired, creds.access_token) {
        return Ok(token);
    }

    let refresh_token = creds.refresh_token.ok_or(EngineError::NoCredentials {
        engine: "gemini",
        detail: "access token expired and no refresh token".to_string(),
    })?;
    let response = ctx
        .http
        .post(TOKEN_URL)
        .form(&[
            ("client_id", oauth_client_id()),
            ("client_secret", oauth_client_secret()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token".to_string()),
        ])
        .timeout(ctx.timeout)
        .send()
        .await?
        .error_for_status()?;
    let refreshed: RefreshWire = response.json().await?;
    Ok(refreshed.access_token)
}

#[async_trait]
impl Engine for GeminiEngine {
    fn kind(&self) -> EngineKind {
        self.kind
    }

    async fn usage(&self, ctx: &UsageContext) -> Result<UsageStatus, EngineError> {
        let token = access_token(ctx).await?;
        let response = ctx
            .http
            .post(LOAD_URL)
            .bearer_auth(token)
            .json(&serde_json::json!({ "metadata": { "pluginType": "GEMINI" } }))
            .timeout(ctx.timeout)
            .send()
            .await?
            .error_for_status()?;
        let payload: LoadPayloadWire = response.json().await?;
        Ok(windows_for_model(ctx, &payload, self.model))
    }

    fn build_invocation(&self, task: &TaskSpec) -> Invocation {
        let mut args = vec![
            "-m".to_string(),
            self.model.to_string(),
            "-p".to_string(),
            task.prompt.clone(),
            "--yolo".to_string(),
        ];
        if let Some(session) = &task.resume_session {
            args.push("--resume".to_string());
            args.push(session.clone());
        }
        Invocation { program: "gemini".to_string(), args, env: Vec::new(), stdin: None }
    }
}

#[cfg(test)]
#[path = "gemini_tests.rs"]
mod tests;
