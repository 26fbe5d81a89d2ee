// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

use super::*;
use chrono::TimeZone;

#[test]
fn quota_comment_names_the_resume_time() {
    let resume = Utc.with_ymd_and_hms(2026, 2, 11, 11, 0, 0).unwrap();
    let comment = comment_quota(resume);
    assert!(comment.contains("out of quota"));
    assert!(comment.contains("resume"));
    // The formatted local time carries the date.
    assert!(comment.contains("2026-02-11") || comment.contains("2026-02-12"));
}

#[test]
fn needs_reply_comment_carries_the_marker() {
    let comment = comment_needs_reply(Some("Which database should I target?"));
    assert!(comment.starts_with(NEEDS_REPLY_COMMENT_MARKER));
    assert!(comment.contains("Which database"));
}

#[test]
fn crash_comment_names_the_pid() {
    let comment = comment_crashed(4242);
    assert!(comment.contains("4242"));
    assert!(comment.contains(NEEDS_REPLY_COMMENT_MARKER));
}

#[test]
fn done_comment_includes_summary_when_present() {
    assert!(comment_done(Some("patched the parser")).contains("patched the parser"));
    assert!(comment_done(None).contains("no summary"));
}

#[test]
fn failed_comment_fences_the_tail() {
    let comment = comment_failed("error: everything broke");
    assert!(comment.contains("```"));
    assert!(comment.contains("everything broke"));
    assert!(comment_failed("  ").contains("no output"));
}
