// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

use super::*;
use ar_core::FollowupReason;

fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    let digest = mac.finalize().into_bytes();
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("sha256={hex}")
}

#[test]
fn valid_signature_verifies() {
    let body = br#"{"zen":"Keep it logically awesome."}"#;
    let header = sign("shh", body);
    assert!(verify_signature("shh", body, &header));
}

#[yare::parameterized(
    wrong_secret = { "other" },
    tampered_body = { "shh" },
)]
fn bad_signatures_fail(secret: &str) {
    let body = br#"{"zen":"Keep it logically awesome."}"#;
    let mut header = sign(secret, body);
    if secret == "shh" {
        // Same secret, different body.
        header = sign(secret, b"something else");
    }
    assert!(!verify_signature("shh", body, &header));
}

#[yare::parameterized(
    missing_prefix = { "deadbeef" },
    odd_length = { "sha256=abc" },
    not_hex = { "sha256=zzzz" },
    empty = { "" },
)]
fn malformed_headers_fail_closed(header: &str) {
    assert!(!verify_signature("shh", b"body", header));
}

fn issue_comment_payload(body: &str, association: &str, login: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "action": "created",
        "comment": {
            "id": 777,
            "body": body,
            "user": { "login": login },
            "author_association": association,
            "created_at": "2026-02-11T10:00:00Z",
        },
        "issue": {
            "id": 424242,
            "number": 5,
            "title": "Fix the flaky test",
            "html_url": "https://github.com/metyatech/demo/issues/5",
        },
        "repository": { "name": "demo", "owner": { "login": "metyatech" } },
    }))
    .unwrap()
}

#[test]
fn command_comment_classifies_as_command() {
    let payload = issue_comment_payload("/agent run", "OWNER", "alice");
    let action = classify_event("issue_comment", &payload, &[]).unwrap();
    match action {
        WebhookAction::Command(cmd) => {
            assert_eq!(cmd.comment_id, 777);
            assert_eq!(cmd.issue_number, 5);
            assert_eq!(cmd.repo.to_string(), "metyatech/demo");
        }
        other => panic!("expected command, got {other:?}"),
    }
}

#[test]
fn unauthorized_command_is_ignored() {
    let payload = issue_comment_payload("/agent run", "CONTRIBUTOR", "drive-by");
    let action = classify_event("issue_comment", &payload, &[]).unwrap();
    assert!(matches!(action, WebhookAction::Ignored(_)));
}

#[test]
fn bot_command_is_ignored() {
    let payload = issue_comment_payload("/agent run", "OWNER", "agent-runner[bot]");
    let action = classify_event("issue_comment", &payload, &[]).unwrap();
    assert!(matches!(action, WebhookAction::Ignored(_)));
}

fn review_payload(state: &str, body: &str, login: &str, association: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "action": "submitted",
        "review": {
            "id": 1,
            "state": state,
            "body": body,
            "user": { "login": login },
            "author_association": association,
        },
        "pull_request": {
            "id": 999,
            "number": 12,
            "title": "Add retries",
            "html_url": "https://github.com/metyatech/demo/pull/12",
            "head": { "ref": "agent-runner/issue-5" },
        },
        "repository": { "name": "demo", "owner": { "login": "metyatech" } },
    }))
    .unwrap()
}

#[yare::parameterized(
    approved = { "approved", "", FollowupReason::Approval, false },
    lgtm_comment = { "commented", "LGTM, ship it", FollowupReason::Approval, false },
    changes = { "changes_requested", "needs a test", FollowupReason::Review, true },
    commented = { "commented", "what about the race here?", FollowupReason::Review, true },
)]
fn review_classification(
    state: &str,
    body: &str,
    reason: FollowupReason,
    requires_engine: bool,
) {
    let payload = review_payload(state, body, "alice", "COLLABORATOR");
    let action = classify_event("pull_request_review", &payload, &[]).unwrap();
    match action {
        WebhookAction::Followup(entry) => {
            assert_eq!(entry.reason, reason);
            assert_eq!(entry.requires_engine, requires_engine);
            assert_eq!(entry.pr_number, 12);
        }
        other => panic!("expected followup, got {other:?}"),
    }
}

#[test]
fn unrecognized_bot_review_is_dropped() {
    let payload = review_payload("changes_requested", "nit", "random[bot]", "NONE");
    let action = classify_event("pull_request_review", &payload, &[]).unwrap();
    assert!(matches!(action, WebhookAction::Ignored(_)));
}

#[test]
fn recognized_bot_review_is_kept() {
    let payload = review_payload("changes_requested", "nit", "coderabbitai[bot]", "NONE");
    let bots = vec!["coderabbitai[bot]".to_string()];
    let action = classify_event("pull_request_review", &payload, &bots).unwrap();
    assert!(matches!(action, WebhookAction::Followup(_)));
}

#[test]
fn ping_pongs_and_unknown_events_are_ignored() {
    assert!(matches!(classify_event("ping", b"{}", &[]).unwrap(), WebhookAction::Pong));
    assert!(matches!(
        classify_event("push", b"{}", &[]).unwrap(),
        WebhookAction::Ignored(_)
    ));
}
