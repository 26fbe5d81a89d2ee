// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Review follow-ups on managed PRs: the poll-side scan that enqueues
//! them and the idle-branch drain that acts on them.

use ar_core::{EngineKind, FollowupReason, IssueId, ReviewFollowupEntry};
use ar_github::reviews::ReviewEvent;
use chrono::{DateTime, Utc};

use crate::context::RunnerCtx;
use crate::discovery::QueuedCandidate;
use crate::dispatch;
use crate::gatekeeper;

/// Classify the poll-side review state of one managed PR.
///
/// Mirrors the webhook classification: unresolved threads or a
/// changes-requested/commented review need an engine; a trailing approval
/// is merge-only.
pub fn classify_poll_state(
    unresolved_threads: u64,
    reviews: &[ReviewEvent],
) -> Option<(FollowupReason, bool)> {
    if unresolved_threads > 0 {
        return Some((FollowupReason::Review, true));
    }
    let last_meaningful = reviews.iter().rev().find(|r| {
        matches!(
            r.state.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("approved") | Some("changes_requested") | Some("commented")
        )
    })?;
    match last_meaningful.state.as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("approved") => Some((FollowupReason::Approval, false)),
        Some("changes_requested") => Some((FollowupReason::Review, true)),
        Some("commented") => {
            let body = last_meaningful.body.as_deref().unwrap_or("");
            if ar_github::is_approval_phrase(body) {
                Some((FollowupReason::Approval, false))
            } else if body.trim().is_empty() {
                None
            } else {
                Some((FollowupReason::Review, true))
            }
        }
        _ => None,
    }
}

/// Scan managed PRs for review activity and enqueue follow-ups.
pub async fn scan_managed_prs(ctx: &RunnerCtx) {
    let managed = match ctx.store.list_managed_prs() {
        Ok(managed) => managed,
        Err(e) => {
            tracing::error!(error = %e, "cannot list managed PRs");
            return;
        }
    };
    for (repo, number) in managed {
        let pull = match ctx.gh.get_pull(&repo, number).await {
            Ok(pull) => pull,
            Err(e) => {
                tracing::warn!(repo = %repo, number, error = %e, "cannot fetch managed PR");
                continue;
            }
        };
        if pull.merged_at.is_some() || pull.state.as_deref() == Some("closed") {
            tracing::info!(repo = %repo, number, "managed PR closed, dropping");
            let _ = ctx.store.remove_managed_pr(&repo, number);
            let _ = ctx.store.remove_followup(&repo, number);
            continue;
        }

        let unresolved = match ctx.gh.unresolved_review_threads(&repo, number).await {
            Ok(unresolved) => unresolved,
            Err(e) => {
                tracing::warn!(repo = %repo, number, error = %e, "review-thread query failed");
                continue;
            }
        };
        let reviews = match ctx.gh.list_reviews(&repo, number).await {
            Ok(reviews) => reviews
                .into_iter()
                .filter(|r| {
                    !r.author_is_bot
                        || r.author
                            .as_deref()
                            .map(|login| {
                                ctx.config
                                    .github
                                    .recognized_review_bots
                                    .iter()
                                    .any(|b| b == login)
                            })
                            .unwrap_or(false)
                })
                .collect::<Vec<_>>(),
            Err(e) => {
                tracing::warn!(repo = %repo, number, error = %e, "review listing failed");
                continue;
            }
        };

        if let Some((reason, requires_engine)) = classify_poll_state(unresolved, &reviews) {
            let entry = ReviewFollowupEntry {
                issue_id: IssueId(pull.id),
                pr_number: number,
                repo: repo.clone(),
                url: pull.html_url.clone(),
                reason,
                requires_engine,
            };
            if let Err(e) = ctx.store.upsert_followup(&entry) {
                tracing::warn!(repo = %repo, number, error = %e, "cannot enqueue follow-up");
            }
        }
    }
}

/// Drain the follow-up queue: merge-only entries first, engine entries
/// next when the Codex gate allows and slots remain. Returns how many
/// engine dispatches were started (they are spawned tasks).
pub async fn drain_followups(
    ctx: &RunnerCtx,
    now: DateTime<Utc>,
    slack: usize,
    joins: &mut Vec<tokio::task::JoinHandle<()>>,
) -> usize {
    let entries = match ctx.store.list_followups() {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!(error = %e, "cannot list follow-ups");
            return 0;
        }
    };

    // Merge-only entries do not consume run slots.
    for entry in entries.iter().filter(|e| !e.requires_engine) {
        match ctx.gh.merge_pull(&entry.repo, entry.pr_number).await {
            Ok(()) => {
                tracing::info!(repo = %entry.repo, pr = entry.pr_number, "approved PR merged");
                let _ = ctx.store.remove_followup(&entry.repo, entry.pr_number);
                let _ = ctx.store.remove_managed_pr(&entry.repo, entry.pr_number);
            }
            Err(e) => {
                tracing::warn!(
                    repo = %entry.repo,
                    pr = entry.pr_number,
                    error = %e,
                    "merge failed, follow-up stays queued"
                );
            }
        }
    }

    let engine_entries: Vec<&ReviewFollowupEntry> =
        entries.iter().filter(|e| e.requires_engine).collect();
    if engine_entries.is_empty() || slack == 0 {
        return 0;
    }
    let gate = gatekeeper::evaluate_engine(ctx, EngineKind::Codex, now).await;
    if !gate.allowed {
        tracing::debug!(reason = %gate.reason, "codex gated off, engine follow-ups wait");
        return 0;
    }

    let mut dispatched = 0;
    for entry in engine_entries.into_iter().take(slack) {
        let Some(permit) = ctx.gate.try_acquire(EngineKind::Codex.service()) else {
            break;
        };
        let issue = match ctx.gh.get_issue(&entry.repo, entry.pr_number).await {
            Ok(issue) => issue,
            Err(e) => {
                tracing::warn!(repo = %entry.repo, pr = entry.pr_number, error = %e,
                    "cannot fetch PR for follow-up");
                continue;
            }
        };
        let _ = ctx.store.remove_followup(&entry.repo, entry.pr_number);
        let session = ctx.store.session(issue.id).ok().flatten();
        let candidate = QueuedCandidate {
            issue,
            enqueued_at: now,
            session,
            resume_prompt: Some(
                "A reviewer left feedback on this pull request. Fetch the review \
                 comments, address them, and push the fixes to the PR branch."
                    .to_string(),
            ),
        };
        let ctx_task = ctx.clone();
        joins.push(tokio::spawn(async move {
            dispatch::dispatch_issue(ctx_task, candidate, EngineKind::Codex, permit, now).await;
        }));
        dispatched += 1;
    }
    dispatched
}

#[cfg(test)]
#[path = "followup_tests.rs"]
mod tests;
