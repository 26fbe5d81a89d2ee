// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

use super::*;
use ar_core::test_support;

#[test]
fn issue_prompt_carries_title_body_and_protocol() {
    let issue = test_support::issue(5)
        .title("Fix the flaky test")
        .build();
    let prompt = issue_prompt(&issue, None);
    assert!(prompt.contains("metyatech/demo#5"));
    assert!(prompt.contains("Fix the flaky test"));
    assert!(prompt.contains("AGENT_RUNNER_SUMMARY_START"));
    assert!(prompt.contains("AGENT_RUNNER_NEEDS_USER_REPLY"));
}

#[test]
fn issue_prompt_appends_user_reply_on_resume() {
    let issue = test_support::issue(5).build();
    let prompt = issue_prompt(&issue, Some("target postgres, not sqlite"));
    assert!(prompt.contains("The user replied"));
    assert!(prompt.contains("target postgres, not sqlite"));
}

#[test]
fn created_pr_is_parsed_from_log() {
    let repo = test_support::repo();
    let log = "pushed branch\nOpened https://github.com/metyatech/demo/pull/77\ndone";
    assert_eq!(parse_created_pr(log, &repo), Some(77));
}

#[test]
fn pr_links_to_other_repos_are_ignored() {
    let repo = test_support::repo();
    let log = "see https://github.com/other/repo/pull/99 for context";
    assert_eq!(parse_created_pr(log, &repo), None);
}

#[test]
fn last_pr_link_wins() {
    let repo = test_support::repo();
    let log = "https://github.com/metyatech/demo/pull/1 then https://github.com/metyatech/demo/pull/2";
    assert_eq!(parse_created_pr(log, &repo), Some(2));
}
