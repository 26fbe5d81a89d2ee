// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Per-engine gate evaluation: quota read, ramp decision, and the Gemini
//! warm-up exception.

use ar_core::{evaluate_usage_gate, DenyCause, EngineKind, GateDecision};
use ar_engines::{engine_for, gemini, timed_usage, UsageContext};
use ar_storage::{StateStore, StorageError};
use chrono::{DateTime, Duration, Utc};
use std::time::Duration as StdDuration;

use crate::context::RunnerCtx;

/// Outcome of gating one engine for this cycle.
#[derive(Debug, Clone)]
pub struct GateOutcome {
    pub engine: EngineKind,
    pub allowed: bool,
    /// Set when the allowance is a one-shot Gemini warm-up grant.
    pub warmup: bool,
    pub reason: String,
}

fn gemini_model(kind: EngineKind) -> Option<&'static str> {
    match kind {
        EngineKind::GeminiPro => Some(gemini::MODEL_PRO),
        EngineKind::GeminiFlash => Some(gemini::MODEL_FLASH),
        _ => None,
    }
}

/// The Gemini model a denied engine may warm up, if any.
///
/// The warm-up exception applies only when the windows are actually
/// blocked; missing usage data or an out-of-window reset never warrants
/// burning a warm-up attempt.
fn warmup_model(kind: EngineKind, cause: DenyCause) -> Option<&'static str> {
    if !cause.is_exhaustion() {
        return None;
    }
    gemini_model(kind)
}

/// One-shot warm-up bookkeeping: grants when the per-model cool-down has
/// elapsed and records the attempt.
fn warmup_grant(
    store: &StateStore,
    model: &str,
    cooldown: Duration,
    now: DateTime<Utc>,
) -> Result<bool, StorageError> {
    let last = store.gemini_warmup_last_attempt(model)?;
    let elapsed = last.map(|at| now - at >= cooldown).unwrap_or(true);
    if !elapsed {
        return Ok(false);
    }
    store.record_gemini_warmup(model, now)?;
    Ok(true)
}

/// Start of the UTC day containing `now` (Amazon Q counter bucket).
pub fn day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()).unwrap_or(now)
}

/// Evaluate whether `kind` may take new work at `now`.
///
/// A quota read or parse failure denies the engine for this cycle only.
pub async fn evaluate_engine(
    ctx: &RunnerCtx,
    kind: EngineKind,
    now: DateTime<Utc>,
) -> GateOutcome {
    let engine = engine_for(kind);
    let mut usage_ctx = UsageContext::new(
        now,
        StdDuration::from_secs(ctx.config.timeouts.usage_secs),
    );
    usage_ctx.http = ctx.http.clone();
    usage_ctx.amazon_q_daily_cap = ctx.config.gates.amazon_q_daily_cap;
    if kind == EngineKind::AmazonQ {
        match ctx.store.amazon_q_usage(day_start(now)) {
            Ok(used) => usage_ctx.amazon_q_used_today = used,
            Err(e) => {
                tracing::warn!(error = %e, "cannot read amazon q counter, assuming unused");
            }
        }
    }

    let status = match timed_usage(engine.as_ref(), &usage_ctx).await {
        Ok(status) => status,
        Err(e) => {
            return GateOutcome {
                engine: kind,
                allowed: false,
                warmup: false,
                reason: format!("usage read failed: {e}"),
            };
        }
    };

    let gate = ctx.config.gates.for_engine(kind);
    match evaluate_usage_gate(now, &status, gate) {
        GateDecision::Allow { minutes_to_reset, .. } => GateOutcome {
            engine: kind,
            allowed: true,
            warmup: false,
            reason: format!("allowed, {minutes_to_reset:.0}m to reset"),
        },
        GateDecision::Deny { cause, reason } => try_gemini_warmup(ctx, kind, cause, now, reason),
    }
}

/// When a Gemini variant is blocked on quota, grant a one-shot warm-up
/// run if the per-model cool-down has elapsed, recording the attempt.
fn try_gemini_warmup(
    ctx: &RunnerCtx,
    kind: EngineKind,
    cause: DenyCause,
    now: DateTime<Utc>,
    deny_reason: String,
) -> GateOutcome {
    let denied = GateOutcome { engine: kind, allowed: false, warmup: false, reason: deny_reason };
    let Some(model) = warmup_model(kind, cause) else {
        return denied;
    };

    let cooldown = Duration::minutes(ctx.config.gates.gemini_warmup_cooldown_minutes);
    match warmup_grant(&ctx.store, model, cooldown, now) {
        Ok(true) => {
            tracing::info!(model, "granting one-shot gemini warm-up run");
            GateOutcome {
                engine: kind,
                allowed: true,
                warmup: true,
                reason: format!("warm-up grant for {model}"),
            }
        }
        Ok(false) => denied,
        Err(e) => {
            tracing::warn!(error = %e, model, "warm-up bookkeeping failed");
            denied
        }
    }
}

/// First gate-allowed engine from the configured preference order.
pub async fn pick_issue_engine(ctx: &RunnerCtx, now: DateTime<Utc>) -> Option<EngineKind> {
    for kind in &ctx.config.scheduler.issue_engines {
        let outcome = evaluate_engine(ctx, *kind, now).await;
        if outcome.allowed {
            return Some(*kind);
        }
        tracing::debug!(engine = %kind, reason = %outcome.reason, "engine gated off");
    }
    None
}

/// All idle engines currently allowed, in configured order.
pub async fn allowed_idle_engines(ctx: &RunnerCtx, now: DateTime<Utc>) -> Vec<EngineKind> {
    let mut allowed = Vec::new();
    for kind in &ctx.config.idle.engines {
        let outcome = evaluate_engine(ctx, *kind, now).await;
        if outcome.allowed {
            allowed.push(*kind);
        } else {
            tracing::debug!(engine = %kind, reason = %outcome.reason, "idle engine gated off");
        }
    }
    allowed
}

#[cfg(test)]
#[path = "gatekeeper_tests.rs"]
mod tests;
