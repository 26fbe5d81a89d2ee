// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Webhook signature verification and event classification.
//!
//! The listener verifies `X-Hub-Signature-256` before parsing, then maps
//! the four consumed event kinds into scheduler work items. Events are
//! never executed inline; they enqueue into the state store.

use crate::command::parse_agent_command;
use crate::command::is_authorized_association;
use crate::reviews::is_approval_phrase;
use crate::wire::{CommentWire, IssueWire, PullWire, RepoWire, ReviewWire, UserWire};
use ar_core::{FollowupReason, IssueId, RepoRef, ReviewFollowupEntry};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verify a GitHub `X-Hub-Signature-256` header against the body.
///
/// Constant-time comparison via the MAC itself; malformed headers fail
/// closed.
pub fn verify_signature(secret: &str, body: &[u8], signature_header: &str) -> bool {
    let Some(hex_digest) = signature_header.strip_prefix("sha256=") else {
        return false;
    };
    let Some(expected) = decode_hex(hex_digest) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
        .collect()
}

/// A `/agent run` request arriving over the webhook.
#[derive(Debug, Clone)]
pub struct CommandEvent {
    pub comment_id: u64,
    pub issue_id: IssueId,
    pub issue_number: u64,
    pub repo: RepoRef,
    pub url: String,
    pub title: String,
}

/// What the scheduler should do with a webhook delivery.
#[derive(Debug, Clone)]
pub enum WebhookAction {
    /// `ping` — answer and do nothing.
    Pong,
    /// A valid `/agent run` comment: enqueue the issue.
    Command(CommandEvent),
    /// A review event on a PR: enqueue a follow-up (the caller still
    /// checks the PR is managed).
    Followup(ReviewFollowupEntry),
    /// Everything else, with the reason it was dropped.
    Ignored(&'static str),
}

#[derive(Deserialize)]
struct IssueCommentPayload {
    action: String,
    comment: CommentWire,
    issue: IssueWire,
    repository: RepoWire,
}

#[derive(Deserialize)]
struct ReviewPayload {
    action: String,
    review: ReviewWire,
    pull_request: PullWire,
    repository: RepoWire,
}

#[derive(Deserialize)]
struct ReviewCommentPayload {
    action: String,
    comment: ReviewCommentWire,
    pull_request: PullWire,
    repository: RepoWire,
}

#[derive(Deserialize)]
struct ReviewCommentWire {
    #[allow(dead_code)]
    id: u64,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    user: Option<UserWire>,
    #[serde(default)]
    author_association: Option<String>,
}

/// Classify one delivery by event name and JSON payload.
pub fn classify_event(
    event: &str,
    payload: &[u8],
    recognized_review_bots: &[String],
) -> Result<WebhookAction, serde_json::Error> {
    match event {
        "ping" => Ok(WebhookAction::Pong),
        "issue_comment" => {
            let parsed: IssueCommentPayload = serde_json::from_slice(payload)?;
            Ok(classify_issue_comment(parsed))
        }
        "pull_request_review" => {
            let parsed: ReviewPayload = serde_json::from_slice(payload)?;
            Ok(classify_review(parsed, recognized_review_bots))
        }
        "pull_request_review_comment" => {
            let parsed: ReviewCommentPayload = serde_json::from_slice(payload)?;
            Ok(classify_review_comment(parsed, recognized_review_bots))
        }
        _ => Ok(WebhookAction::Ignored("unconsumed event")),
    }
}

fn repo_of(wire: &RepoWire) -> RepoRef {
    RepoRef::new(wire.owner.login.clone(), wire.name.clone())
}

fn classify_issue_comment(payload: IssueCommentPayload) -> WebhookAction {
    if payload.action != "created" {
        return WebhookAction::Ignored("not a created comment");
    }
    let comment = &payload.comment;
    if comment.user.as_ref().map(|u| u.is_bot()).unwrap_or(false) {
        return WebhookAction::Ignored("bot comment");
    }
    if !is_authorized_association(comment.author_association.as_deref()) {
        return WebhookAction::Ignored("author not collaborator or above");
    }
    let body = comment.body.as_deref().unwrap_or("");
    if !parse_agent_command(body) {
        return WebhookAction::Ignored("no command");
    }
    WebhookAction::Command(CommandEvent {
        comment_id: comment.id,
        issue_id: IssueId(payload.issue.id),
        issue_number: payload.issue.number,
        repo: repo_of(&payload.repository),
        url: payload.issue.html_url.clone(),
        title: payload.issue.title.clone(),
    })
}

/// Principal filter shared by both review event kinds: drop bots unless
/// explicitly recognized, drop authors below collaborator.
fn review_principal_allowed(
    user: Option<&UserWire>,
    association: Option<&str>,
    recognized_review_bots: &[String],
) -> bool {
    if let Some(user) = user {
        if user.is_bot() {
            return recognized_review_bots.iter().any(|b| b == &user.login);
        }
    }
    is_authorized_association(association)
}

fn followup(
    repo: RepoRef,
    pull: &PullWire,
    reason: FollowupReason,
    requires_engine: bool,
) -> WebhookAction {
    WebhookAction::Followup(ReviewFollowupEntry {
        issue_id: IssueId(pull.id),
        pr_number: pull.number,
        repo,
        url: pull.html_url.clone(),
        reason,
        requires_engine,
    })
}

fn classify_review(payload: ReviewPayload, recognized_review_bots: &[String]) -> WebhookAction {
    if payload.action != "submitted" {
        return WebhookAction::Ignored("not a submitted review");
    }
    let review = &payload.review;
    if !review_principal_allowed(
        review.user.as_ref(),
        review.author_association.as_deref(),
        recognized_review_bots,
    ) {
        return WebhookAction::Ignored("review principal filtered");
    }

    let repo = repo_of(&payload.repository);
    let state = review.state.as_deref().unwrap_or("");
    let body = review.body.as_deref().unwrap_or("");

    if state.eq_ignore_ascii_case("approved") || is_approval_phrase(body) {
        return followup(repo, &payload.pull_request, FollowupReason::Approval, false);
    }
    if state.eq_ignore_ascii_case("changes_requested") {
        return followup(repo, &payload.pull_request, FollowupReason::Review, true);
    }
    if state.eq_ignore_ascii_case("commented") && !body.trim().is_empty() {
        return followup(repo, &payload.pull_request, FollowupReason::Review, true);
    }
    WebhookAction::Ignored("empty review")
}

fn classify_review_comment(
    payload: ReviewCommentPayload,
    recognized_review_bots: &[String],
) -> WebhookAction {
    if payload.action != "created" {
        return WebhookAction::Ignored("not a created review comment");
    }
    if !review_principal_allowed(
        payload.comment.user.as_ref(),
        payload.comment.author_association.as_deref(),
        recognized_review_bots,
    ) {
        return WebhookAction::Ignored("review principal filtered");
    }
    if payload.comment.body.as_deref().unwrap_or("").trim().is_empty() {
        return WebhookAction::Ignored("empty review comment");
    }
    followup(
        repo_of(&payload.repository),
        &payload.pull_request,
        FollowupReason::ReviewComment,
        true,
    )
}

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod tests;
