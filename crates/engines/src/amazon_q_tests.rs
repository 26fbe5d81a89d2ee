// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

use super::*;
use chrono::TimeZone;
use std::time::Duration as StdDuration;

fn ctx(used: u32, cap: u32) -> UsageContext {
    let mut ctx = UsageContext::new(
        Utc.with_ymd_and_hms(2026, 2, 11, 10, 0, 0).unwrap(),
        StdDuration::from_secs(5),
    );
    ctx.amazon_q_used_today = used;
    ctx.amazon_q_daily_cap = cap;
    ctx
}

#[yare::parameterized(
    unused = { 0, 50, 100.0 },
    half = { 25, 50, 50.0 },
    exhausted = { 50, 50, 0.0 },
    over_count = { 60, 50, 0.0 },
)]
fn counter_maps_to_percent_left(used: u32, cap: u32, expected: f64) {
    let status = synthetic_status(&ctx(used, cap));
    assert!((status.long.unwrap().percent_left - expected).abs() < f64::EPSILON);
}

#[test]
fn window_resets_at_next_utc_midnight() {
    let status = synthetic_status(&ctx(1, 50));
    assert_eq!(
        status.long.unwrap().resets_at,
        Utc.with_ymd_and_hms(2026, 2, 12, 0, 0, 0).unwrap()
    );
}

#[test]
fn zero_cap_disables_the_gate_data() {
    let status = synthetic_status(&ctx(0, 0));
    assert!(status.long.is_none());
}

#[test]
fn prompt_is_the_final_argument() {
    let inv = AmazonQEngine.build_invocation(&TaskSpec::fresh("summarize repo"));
    assert_eq!(inv.program, "q");
    assert_eq!(inv.args.last().map(String::as_str), Some("summarize repo"));
}
