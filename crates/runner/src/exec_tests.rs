// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

use super::*;
use ar_core::{SUMMARY_END, SUMMARY_START};
use chrono::TimeZone;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 11, 10, 0, 0).unwrap()
}

#[test]
fn exit_zero_is_success() {
    assert_eq!(classify(Some(0), "all done", false, now()), RunStatus::Success);
}

#[test]
fn needs_reply_marker_wins_over_exit_code() {
    let log = format!("asking the user\n{NEEDS_REPLY_MARKER}\n");
    assert_eq!(classify(Some(0), &log, true, now()), RunStatus::NeedsUserReply);
    assert_eq!(classify(Some(1), &log, true, now()), RunStatus::NeedsUserReply);
}

#[yare::parameterized(
    rate_limit = { "ERROR: Rate limit reached for requests" },
    usage_limit = { "You've hit your usage limit reached mark" },
    resource = { "status: RESOURCE_EXHAUSTED" },
)]
fn quota_markers_classify_as_quota(line: &str) {
    match classify(Some(1), line, true, now()) {
        RunStatus::Quota { .. } => {}
        other => panic!("expected quota, got {other:?}"),
    }
}

#[test]
fn quota_resume_at_absolute_form() {
    let log = "rate limit reached. Try again at 2026-02-11T11:00:00Z.";
    let status = classify(Some(1), log, false, now());
    assert_eq!(
        status,
        RunStatus::Quota { resume_at: Some(Utc.with_ymd_and_hms(2026, 2, 11, 11, 0, 0).unwrap()) }
    );
}

#[test]
fn quota_resume_at_relative_form() {
    let log = "quota exceeded, resets in 90 minutes";
    let parsed = parse_resume_at(log, now());
    assert_eq!(parsed, Some(now() + ChronoDuration::minutes(90)));
}

#[test]
fn quota_without_time_has_no_resume_hint() {
    assert_eq!(parse_resume_at("quota exceeded", now()), None);
}

#[test]
fn failure_stage_tracks_session_presence() {
    assert_eq!(
        classify(Some(1), "boom", false, now()),
        RunStatus::ExecutionError { stage: FailureStage::BeforeSession }
    );
    assert_eq!(
        classify(Some(1), "boom", true, now()),
        RunStatus::ExecutionError { stage: FailureStage::AfterSession }
    );
    assert_eq!(
        classify(None, "killed", true, now()),
        RunStatus::ExecutionError { stage: FailureStage::AfterSession }
    );
}

#[test]
fn log_file_names() {
    assert_eq!(
        log_file_name("demo", Some(5), now()),
        format!("demo-issue-5-{}.log", now().timestamp())
    );
    assert_eq!(
        log_file_name("demo", None, now()),
        format!("demo-idle-{}.log", now().timestamp())
    );
}

#[test]
fn tail_returns_last_lines() {
    let log = "a\nb\nc\nd";
    assert_eq!(tail(log, 2), "c\nd");
    assert_eq!(tail(log, 10), log);
}

#[tokio::test]
async fn spawn_and_wait_captures_output_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("logs/demo-issue-1-0.log");
    let script = format!(
        "echo start; echo '{SUMMARY_START}'; echo did the work; echo '{SUMMARY_END}'"
    );
    let req = ExecRequest {
        engine: EngineKind::Codex,
        invocation: Invocation {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script],
            env: Vec::new(),
            stdin: None,
        },
        cwd: dir.path().to_path_buf(),
        log_path: log_path.clone(),
        timeout: Duration::from_secs(10),
    };
    let spawned = spawn_run(&req).await.unwrap();
    assert!(spawned.pid > 0);
    let outcome = wait_run(&req, spawned, now()).await.unwrap();

    assert_eq!(outcome.status, RunStatus::Success);
    assert_eq!(outcome.exit_code, Some(0));
    assert_eq!(outcome.summary.as_deref(), Some("did the work"));
    let log = std::fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("out] start"));
}

#[tokio::test]
async fn wait_times_out_and_kills() {
    let dir = tempfile::tempdir().unwrap();
    let req = ExecRequest {
        engine: EngineKind::Codex,
        invocation: Invocation {
            program: "sleep".to_string(),
            args: vec!["30".to_string()],
            env: Vec::new(),
            stdin: None,
        },
        cwd: dir.path().to_path_buf(),
        log_path: dir.path().join("timeout.log"),
        timeout: Duration::from_millis(100),
    };
    let spawned = spawn_run(&req).await.unwrap();
    let outcome = wait_run(&req, spawned, now()).await.unwrap();
    assert!(outcome.timed_out);
    assert!(matches!(outcome.status, RunStatus::ExecutionError { .. }));
}
