// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

use super::*;

fn review(state: &str, body: &str) -> ReviewEvent {
    ReviewEvent {
        state: Some(state.to_string()),
        body: Some(body.to_string()),
        author: Some("alice".to_string()),
        author_is_bot: false,
        author_association: Some("COLLABORATOR".to_string()),
    }
}

#[test]
fn unresolved_threads_require_an_engine() {
    let result = classify_poll_state(3, &[review("approved", "")]);
    assert_eq!(result, Some((FollowupReason::Review, true)));
}

#[test]
fn trailing_approval_is_merge_only() {
    let reviews = vec![review("changes_requested", "fix it"), review("approved", "")];
    assert_eq!(classify_poll_state(0, &reviews), Some((FollowupReason::Approval, false)));
}

#[test]
fn trailing_changes_requested_needs_an_engine() {
    let reviews = vec![review("approved", ""), review("changes_requested", "regression")];
    assert_eq!(classify_poll_state(0, &reviews), Some((FollowupReason::Review, true)));
}

#[test]
fn lgtm_comment_counts_as_approval() {
    let reviews = vec![review("commented", "LGTM, no new comments")];
    assert_eq!(classify_poll_state(0, &reviews), Some((FollowupReason::Approval, false)));
}

#[test]
fn empty_comment_review_is_no_followup() {
    let reviews = vec![review("commented", "  ")];
    assert_eq!(classify_poll_state(0, &reviews), None);
}

#[test]
fn no_reviews_no_followup() {
    assert_eq!(classify_poll_state(0, &[]), None);
}
