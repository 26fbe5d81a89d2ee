// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

use super::*;
use chrono::{TimeZone, Utc};
use std::time::Duration as StdDuration;

fn ctx_at_home(home: &Path) -> UsageContext {
    let mut ctx = UsageContext::new(
        Utc.with_ymd_and_hms(2026, 2, 11, 10, 0, 0).unwrap(),
        StdDuration::from_secs(5),
    );
    ctx.home = home.to_path_buf();
    ctx
}

#[test]
fn parses_rate_limits_from_event_payload() {
    let line = r#"{"type":"event_msg","payload":{"rate_limits":{"primary":{"used_percent":80.0,"window_minutes":300,"resets_in_seconds":1200},"secondary":{"used_percent":30.0,"window_minutes":10080,"resets_in_seconds":360000}}}}"#;
    let limits = rate_limits_in_line(line).unwrap();
    assert!((limits.primary.unwrap().used_percent - 80.0).abs() < f64::EPSILON);
    assert_eq!(limits.secondary.unwrap().window_minutes, Some(10080));
}

#[test]
fn non_matching_lines_are_skipped_cheaply() {
    assert!(rate_limits_in_line(r#"{"type":"message","text":"hello"}"#).is_none());
    assert!(rate_limits_in_line("not json at all").is_none());
}

#[test]
fn windows_map_to_short_and_long() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = ctx_at_home(dir.path());
    let limits = RateLimitsWire {
        primary: Some(RateLimitWindowWire {
            used_percent: 80.0,
            window_minutes: Some(300),
            resets_in_seconds: Some(1200),
        }),
        secondary: Some(RateLimitWindowWire {
            used_percent: 30.0,
            window_minutes: Some(10080),
            resets_in_seconds: Some(360_000),
        }),
    };
    let status = windows_from_limits(&ctx, limits);
    let short = status.short.unwrap();
    let long = status.long.unwrap();
    assert!((short.percent_left - 20.0).abs() < f64::EPSILON);
    assert!((long.percent_left - 70.0).abs() < f64::EPSILON);
    assert_eq!(short.resets_at, ctx.now + Duration::seconds(1200));
}

#[test]
fn session_scan_finds_last_rate_limit_line() {
    let dir = tempfile::tempdir().unwrap();
    let sessions = dir.path().join(SESSIONS_DIR).join("2026/02/11");
    std::fs::create_dir_all(&sessions).unwrap();
    std::fs::write(
        sessions.join("rollout-1.jsonl"),
        concat!(
            r#"{"payload":{"rate_limits":{"primary":{"used_percent":90.0,"window_minutes":300}}}}"#,
            "\n",
            r#"{"payload":{"rate_limits":{"primary":{"used_percent":40.0,"window_minutes":300}}}}"#,
            "\n",
        ),
    )
    .unwrap();

    let ctx = ctx_at_home(dir.path());
    let status = usage_from_sessions(&ctx).unwrap();
    // Last line wins: 40% used, 60% left, 5h window → short.
    assert!((status.short.unwrap().percent_left - 60.0).abs() < f64::EPSILON);
    assert!(status.long.is_none());
}

#[test]
fn missing_sessions_dir_yields_none() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = ctx_at_home(dir.path());
    assert!(usage_from_sessions(&ctx).is_none());
}

#[test]
fn fresh_invocation_args() {
    let inv = CodexEngine.build_invocation(&TaskSpec::fresh("fix issue #5"));
    assert_eq!(inv.program, "codex");
    assert_eq!(
        inv.args,
        vec!["exec", "--full-auto", "--skip-git-repo-check", "fix issue #5"]
    );
    assert!(inv.stdin.is_none());
}

#[test]
fn resume_invocation_inserts_session() {
    let inv = CodexEngine.build_invocation(&TaskSpec::resume("continue", "sess-1"));
    assert_eq!(
        inv.args,
        vec!["exec", "resume", "sess-1", "--full-auto", "--skip-git-repo-check", "continue"]
    );
}
