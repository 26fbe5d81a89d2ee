// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Copilot engine adapter.
//!
//! Quota comes from the Copilot internal user endpoint; the monthly
//! premium-interaction pool maps to the long window and there is no
//! short window.

use crate::error::EngineError;
use crate::{Engine, Invocation, TaskSpec, UsageContext};
use ar_core::{EngineKind, RawWindow, UsageStatus};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Deserialize;

const APPS_FILE: &str = ".config/github-copilot/apps.json";
const USAGE_URL: &str = "https://api.github.com/copilot_internal/user";

pub struct CopilotEngine;

#[derive(Debug, Deserialize)]
struct AppTokenWire {
    oauth_token: String,
}

#[derive(Debug, Deserialize)]
struct QuotaSnapshotWire {
    #[serde(default)]
    percent_remaining: Option<f64>,
    #[serde(default)]
    quota_reset_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserPayloadWire {
    #[serde(default)]
    quota_snapshots: std::collections::HashMap<String, QuotaSnapshotWire>,
}

fn parse_reset_date(raw: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

fn windows_from_payload(ctx: &UsageContext, payload: UserPayloadWire) -> UsageStatus {
    let Some(snapshot) = payload.quota_snapshots.get("premium_interactions") else {
        return UsageStatus::default();
    };
    let percent_remaining = snapshot.percent_remaining.unwrap_or(0.0);
    let resets_at = snapshot.quota_reset_date.as_deref().and_then(parse_reset_date);
    UsageStatus::normalize(
        ctx.now,
        vec![RawWindow {
            used_percent: 100.0 - percent_remaining,
            resets_at,
            duration: Some(Duration::days(30)),
        }],
    )
}

fn oauth_token(ctx: &UsageContext) -> Result<String, EngineError> {
    let path = ctx.home.join(APPS_FILE);
    let text = std::fs::read_to_string(&path).map_err(|e| EngineError::NoCredentials {
        engine: "copilot",
        detail: format!("cannot read {}: {e}", path.display()),
    })?;
    let apps: std::collections::HashMap<String, AppTokenWire> = serde_json::from_str(&text)
        .map_err(|e| EngineError::NoCredentials {
            engine: "copilot",
            detail: format!("malformed apps.json: {e}"),
        })?;
    apps.into_values().next().map(|a| a.oauth_token).ok_or(EngineError::NoCredentials {
        engine: "copilot",
        detail: "apps.json has no entries".to_string(),
    })
}

#[async_trait]
impl Engine for CopilotEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Copilot
    }

    async fn usage(&self, ctx: &UsageContext) -> Result<UsageStatus, EngineError> {
        let token = oauth_token(ctx)?;
        let response = ctx
            .http
            .get(USAGE_URL)
            .header("Authorization", format!("token {token}"))
            .header("User-Agent", "agent-runner")
            .timeout(ctx.timeout)
            .send()
            .await?
            .error_for_status()?;
        let payload: UserPayloadWire = response.json().await?;
        Ok(windows_from_payload(ctx, payload))
    }

    fn build_invocation(&self, task: &TaskSpec) -> Invocation {
        let mut args = vec!["-p".to_string(), task.prompt.clone(), "--allow-all-tools".to_string()];
        if let Some(session) = &task.resume_session {
            args.push("--resume".to_string());
            args.push(session.clone());
        }
        Invocation { program: "copilot".to_string(), args, env: Vec::new(), stdin: None }
    }
}

#[cfg(test)]
#[path = "copilot_tests.rs"]
mod tests;
