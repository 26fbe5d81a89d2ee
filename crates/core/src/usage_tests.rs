// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

use super::*;
use chrono::TimeZone;

fn gate(start_minutes: f64, start_pct: f64, end_pct: f64, short_floor_pct: f64) -> GateConfig {
    GateConfig { start_minutes, start_pct, end_pct, short_floor_pct }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 11, 10, 0, 0).unwrap()
}

fn window(kind: WindowKind, percent_left: f64, resets_in_minutes: i64) -> UsageWindow {
    UsageWindow { kind, percent_left, resets_at: now() + Duration::minutes(resets_in_minutes) }
}

#[test]
fn allows_per_the_ramp_scenario() {
    // startMinutes=60, startPct=20, endPct=0, shortFloor=5;
    // long 60% left resetting in 30m, short 10% left.
    // required = 0 + (20-0) * (30/60) = 10; 60 >= 10 and 10 >= 5.
    let status = UsageStatus {
        short: Some(window(WindowKind::Short, 10.0, 30)),
        long: Some(window(WindowKind::Long, 60.0, 30)),
    };
    let decision = evaluate_usage_gate(now(), &status, &gate(60.0, 20.0, 0.0, 5.0));
    match decision {
        GateDecision::Allow { minutes_to_reset, .. } => {
            assert!((minutes_to_reset - 30.0).abs() < 0.1);
        }
        GateDecision::Deny { reason, .. } => panic!("expected allow, got deny: {reason}"),
    }
}

fn deny_cause(decision: GateDecision) -> DenyCause {
    match decision {
        GateDecision::Deny { cause, .. } => cause,
        GateDecision::Allow { .. } => panic!("expected deny, got allow"),
    }
}

#[test]
fn denies_when_short_window_below_floor() {
    let status = UsageStatus {
        short: Some(window(WindowKind::Short, 4.0, 30)),
        long: Some(window(WindowKind::Long, 60.0, 30)),
    };
    let decision = evaluate_usage_gate(now(), &status, &gate(60.0, 20.0, 0.0, 5.0));
    assert_eq!(deny_cause(decision), DenyCause::ShortBelowFloor);
}

#[test]
fn denies_without_long_window() {
    let status = UsageStatus {
        short: Some(window(WindowKind::Short, 90.0, 30)),
        long: None,
    };
    let decision = evaluate_usage_gate(now(), &status, &GateConfig::default());
    assert_eq!(deny_cause(decision), DenyCause::NoLongWindow);
}

#[test]
fn denies_too_early_in_period() {
    let status = UsageStatus {
        short: None,
        long: Some(window(WindowKind::Long, 100.0, 120)),
    };
    let decision = evaluate_usage_gate(now(), &status, &gate(60.0, 20.0, 0.0, 5.0));
    assert_eq!(deny_cause(decision), DenyCause::TooEarlyInPeriod);
}

#[test]
fn denies_below_ramp() {
    // At 45m of a 60m window the ramp requires 15%.
    let status = UsageStatus {
        short: None,
        long: Some(window(WindowKind::Long, 14.0, 45)),
    };
    let decision = evaluate_usage_gate(now(), &status, &gate(60.0, 20.0, 0.0, 5.0));
    assert_eq!(deny_cause(decision), DenyCause::LongBelowRamp);
}

#[test]
fn only_window_exhaustion_counts_as_exhaustion() {
    assert!(DenyCause::LongBelowRamp.is_exhaustion());
    assert!(DenyCause::ShortBelowFloor.is_exhaustion());
    assert!(!DenyCause::NoLongWindow.is_exhaustion());
    assert!(!DenyCause::TooEarlyInPeriod.is_exhaustion());
}

#[test]
fn ramp_boundaries_hit_end_and_start_pct() {
    let g = gate(60.0, 20.0, 2.0, 5.0);
    assert!((required_percent(0.0, &g) - 2.0).abs() < f64::EPSILON);
    assert!((required_percent(60.0, &g) - 20.0).abs() < 1e-9);
    // Beyond the window the ramp clamps at start_pct.
    assert!((required_percent(120.0, &g) - 20.0).abs() < 1e-9);
}

#[test]
fn expired_long_window_requires_only_end_pct() {
    // resets_at in the past clamps minutes_to_reset to zero.
    let status = UsageStatus {
        short: None,
        long: Some(window(WindowKind::Long, 1.0, -10)),
    };
    let decision = evaluate_usage_gate(now(), &status, &gate(60.0, 20.0, 0.0, 5.0));
    assert!(decision.is_allowed());
}

proptest::proptest! {
    /// Ramp requirement is monotonically non-decreasing in minutes-to-reset
    /// over [0, start_minutes] whenever start_pct >= end_pct.
    #[test]
    fn ramp_is_monotone(m1 in 0.0f64..60.0, m2 in 0.0f64..60.0) {
        let g = gate(60.0, 20.0, 0.0, 5.0);
        let (lo, hi) = if m1 <= m2 { (m1, m2) } else { (m2, m1) };
        proptest::prop_assert!(required_percent(lo, &g) <= required_percent(hi, &g));
    }
}

#[test]
fn normalize_pairs_by_duration() {
    let raw = vec![
        RawWindow {
            used_percent: 30.0,
            resets_at: None,
            duration: Some(Duration::days(7)),
        },
        RawWindow {
            used_percent: 80.0,
            resets_at: None,
            duration: Some(Duration::hours(5)),
        },
    ];
    let status = UsageStatus::normalize(now(), raw);
    let short = status.short.unwrap();
    let long = status.long.unwrap();
    assert!((short.percent_left - 20.0).abs() < f64::EPSILON);
    assert!((long.percent_left - 70.0).abs() < f64::EPSILON);
    assert_eq!(long.resets_at, now() + Duration::days(7));
}

#[yare::parameterized(
    day_or_more_is_long = { 24, true },
    week_is_long = { 168, true },
    five_hours_is_short = { 5, false },
)]
fn normalize_single_window_classification(hours: i64, expect_long: bool) {
    let raw = vec![RawWindow {
        used_percent: 50.0,
        resets_at: None,
        duration: Some(Duration::hours(hours)),
    }];
    let status = UsageStatus::normalize(now(), raw);
    assert_eq!(status.long.is_some(), expect_long);
    assert_eq!(status.short.is_some(), !expect_long);
}

#[test]
fn normalize_clamps_percent() {
    let raw = vec![RawWindow {
        used_percent: 130.0,
        resets_at: None,
        duration: Some(Duration::hours(1)),
    }];
    let status = UsageStatus::normalize(now(), raw);
    assert!((status.short.unwrap().percent_left - 0.0).abs() < f64::EPSILON);
}

#[test]
fn normalize_prefers_explicit_reset() {
    let explicit = now() + Duration::hours(3);
    let raw = vec![RawWindow {
        used_percent: 10.0,
        resets_at: Some(explicit),
        duration: Some(Duration::hours(5)),
    }];
    let status = UsageStatus::normalize(now(), raw);
    assert_eq!(status.short.unwrap().resets_at, explicit);
}
