// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Amazon Q engine adapter.
//!
//! Q has no queryable quota backend, so the runner keeps a local per-day
//! request counter; this adapter turns that counter and the configured
//! daily cap into a synthetic 24-hour long window resetting at the next
//! UTC midnight.

use crate::error::EngineError;
use crate::{Engine, Invocation, TaskSpec, UsageContext};
use ar_core::{EngineKind, UsageStatus, UsageWindow, WindowKind};
use async_trait::async_trait;
use chrono::{Duration, Utc};

pub struct AmazonQEngine;

fn synthetic_status(ctx: &UsageContext) -> UsageStatus {
    if ctx.amazon_q_daily_cap == 0 {
        // No cap configured: nothing to evaluate against.
        return UsageStatus::default();
    }
    let used = ctx.amazon_q_used_today.min(ctx.amazon_q_daily_cap) as f64;
    let cap = ctx.amazon_q_daily_cap as f64;
    let next_midnight = (ctx.now + Duration::days(1))
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|| Utc::now() + Duration::days(1));
    UsageStatus {
        short: None,
        long: Some(UsageWindow {
            kind: WindowKind::Long,
            percent_left: (100.0 * (1.0 - used / cap)).clamp(0.0, 100.0),
            resets_at: next_midnight,
        }),
    }
}

#[async_trait]
impl Engine for AmazonQEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::AmazonQ
    }

    async fn usage(&self, ctx: &UsageContext) -> Result<UsageStatus, EngineError> {
        Ok(synthetic_status(ctx))
    }

    fn build_invocation(&self, task: &TaskSpec) -> Invocation {
        let mut args = vec![
            "chat".to_string(),
            "--no-interactive".to_string(),
            "--trust-all-tools".to_string(),
        ];
        if let Some(session) = &task.resume_session {
            args.push("--resume".to_string());
            args.push(session.clone());
        }
        args.push(task.prompt.clone());
        Invocation { program: "q".to_string(), args, env: Vec::new(), stdin: None }
    }
}

#[cfg(test)]
#[path = "amazon_q_tests.rs"]
mod tests;
