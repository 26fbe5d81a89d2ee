// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Usage windows and the two-window gate evaluator
//!
//! Every engine backend reports quota in its own shape; adapters map those
//! payloads into at most two [`UsageWindow`]s (a short hard-floor window
//! and a long ramped window) and evaluation is identical from there.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Which of the two gate windows a normalized window plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    Short,
    Long,
}

/// A normalized quota window: how much is left and when it resets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageWindow {
    pub kind: WindowKind,
    /// Remaining allowance in percent, clamped to `[0, 100]`.
    pub percent_left: f64,
    pub resets_at: DateTime<Utc>,
}

/// The `(short, long)` window pair for one engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<UsageWindow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<UsageWindow>,
}

/// A backend window before normalization.
#[derive(Debug, Clone)]
pub struct RawWindow {
    /// Consumed allowance in percent, as the backend reports it.
    pub used_percent: f64,
    /// Explicit reset instant, when the backend provides one.
    pub resets_at: Option<DateTime<Utc>>,
    /// Window duration, when the backend provides one.
    pub duration: Option<Duration>,
}

impl RawWindow {
    fn percent_left(&self) -> f64 {
        (100.0 - self.used_percent).clamp(0.0, 100.0)
    }

    fn resolved_reset(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match (self.resets_at, self.duration) {
            (Some(at), _) => at,
            (None, Some(d)) => now + d,
            (None, None) => now,
        }
    }

    /// Duration used for short/long classification: the declared window
    /// duration, else the distance to the declared reset.
    fn effective_duration(&self, now: DateTime<Utc>) -> Duration {
        match (self.duration, self.resets_at) {
            (Some(d), _) => d,
            (None, Some(at)) => (at - now).max(Duration::zero()),
            (None, None) => Duration::zero(),
        }
    }
}

impl UsageStatus {
    /// Normalize backend windows into the `(short, long)` pair.
    ///
    /// With two windows the shorter-duration one is `short`; with one, it
    /// is `long` if its duration is at least 24 hours, else `short`.
    /// Extra windows beyond two are ignored.
    pub fn normalize(now: DateTime<Utc>, mut raw: Vec<RawWindow>) -> UsageStatus {
        let window = |r: &RawWindow, kind: WindowKind| UsageWindow {
            kind,
            percent_left: r.percent_left(),
            resets_at: r.resolved_reset(now),
        };

        match raw.len() {
            0 => UsageStatus::default(),
            1 => {
                let only = &raw[0];
                if only.effective_duration(now) >= Duration::hours(24) {
                    UsageStatus { short: None, long: Some(window(only, WindowKind::Long)) }
                } else {
                    UsageStatus { short: Some(window(only, WindowKind::Short)), long: None }
                }
            }
            _ => {
                raw.sort_by_key(|r| r.effective_duration(now));
                UsageStatus {
                    short: Some(window(&raw[0], WindowKind::Short)),
                    long: Some(window(&raw[raw.len() - 1], WindowKind::Long)),
                }
            }
        }
    }
}

/// Gate thresholds for one engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// How early in the long period scheduling may begin, in minutes
    /// before the reset.
    pub start_minutes: f64,
    /// Required remaining percent at `start_minutes` before reset.
    pub start_pct: f64,
    /// Required remaining percent at the reset instant.
    pub end_pct: f64,
    /// Hard floor on the short window's remaining percent.
    pub short_floor_pct: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        // A weekly window: start scheduling two days out, ramp 20% → 0%.
        Self {
            start_minutes: 2.0 * 24.0 * 60.0,
            start_pct: 20.0,
            end_pct: 0.0,
            short_floor_pct: 5.0,
        }
    }
}

/// Why the gate denied an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyCause {
    /// No long-window usage data was available.
    NoLongWindow,
    /// The reset is still beyond the scheduling window.
    TooEarlyInPeriod,
    /// The long window is below the ramp requirement.
    LongBelowRamp,
    /// The short window is below its hard floor.
    ShortBelowFloor,
}

impl DenyCause {
    /// True when the denial means quota is actually used up, as opposed
    /// to missing data or an out-of-window reset.
    pub fn is_exhaustion(&self) -> bool {
        matches!(self, DenyCause::LongBelowRamp | DenyCause::ShortBelowFloor)
    }
}

/// Outcome of a gate evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GateDecision {
    Allow {
        /// The long window the decision was made against.
        window: UsageWindow,
        minutes_to_reset: f64,
    },
    Deny {
        cause: DenyCause,
        reason: String,
    },
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allow { .. })
    }

    fn deny(cause: DenyCause, reason: impl Into<String>) -> Self {
        GateDecision::Deny { cause, reason: reason.into() }
    }
}

/// Remaining percent required at `minutes_to_reset`: a linear ramp from
/// `start_pct` (far from reset) down to `end_pct` (at reset).
pub fn required_percent(minutes_to_reset: f64, gate: &GateConfig) -> f64 {
    let frac = (minutes_to_reset / gate.start_minutes.max(1.0)).clamp(0.0, 1.0);
    gate.end_pct + (gate.start_pct - gate.end_pct) * frac
}

/// Evaluate the two-window gate for one engine at `now`.
pub fn evaluate_usage_gate(
    now: DateTime<Utc>,
    status: &UsageStatus,
    gate: &GateConfig,
) -> GateDecision {
    let Some(long) = &status.long else {
        return GateDecision::deny(DenyCause::NoLongWindow, "no long-window usage data");
    };

    let minutes_to_reset = ((long.resets_at - now).num_seconds() as f64 / 60.0).max(0.0);
    if minutes_to_reset > gate.start_minutes {
        return GateDecision::deny(
            DenyCause::TooEarlyInPeriod,
            format!(
                "too early in period: {minutes_to_reset:.0}m to reset, window opens at {:.0}m",
                gate.start_minutes
            ),
        );
    }

    let required = required_percent(minutes_to_reset, gate);
    if long.percent_left < required {
        return GateDecision::deny(
            DenyCause::LongBelowRamp,
            format!(
                "long window below ramp: {:.1}% left, {required:.1}% required",
                long.percent_left
            ),
        );
    }

    if let Some(short) = &status.short {
        if short.percent_left < gate.short_floor_pct {
            return GateDecision::deny(
                DenyCause::ShortBelowFloor,
                format!(
                    "short window below floor: {:.1}% left, {:.1}% required",
                    short.percent_left, gate.short_floor_pct
                ),
            );
        }
    }

    GateDecision::Allow { window: long.clone(), minutes_to_reset }
}

#[cfg(test)]
#[path = "usage_tests.rs"]
mod tests;
