// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Input discovery: target repos, new `/agent run` requests, webhook
//! queue drain, webhook catch-up, scheduled-retry and user-reply
//! resumption. Everything funnels into [`QueuedCandidate`]s for the
//! cycle's fair FIFO selection.

use ar_core::{Issue, IssueState, RepoRef};
use ar_github::{command_requests, GithubError};
use chrono::{DateTime, Duration, Utc};

use crate::context::RunnerCtx;
use crate::error::RunnerError;
use crate::lifecycle;
use crate::user_reply::find_user_reply;

/// An issue ready for selection this cycle.
#[derive(Debug, Clone)]
pub struct QueuedCandidate {
    pub issue: Issue,
    pub enqueued_at: DateTime<Utc>,
    pub session: Option<String>,
    /// Extra context for resumes (e.g. the user's reply text).
    pub resume_prompt: Option<String>,
}

/// How long a rate-limit fallback stays sticky in the status snapshot.
const RATE_LIMIT_BACKOFF_MINUTES: i64 = 60;

/// Enumerate target repositories per config, with cached fallback when
/// GitHub is rate limiting.
pub async fn discover_repos(
    ctx: &RunnerCtx,
    now: DateTime<Utc>,
) -> Result<Vec<RepoRef>, RunnerError> {
    match &ctx.config.github.repos {
        ar_core::RepoTarget::List(names) => {
            let mut repos = Vec::new();
            for name in names {
                match name.parse::<RepoRef>() {
                    Ok(repo) => repos.push(repo),
                    Err(e) => tracing::warn!(entry = %name, error = %e, "skipping bad repo entry"),
                }
            }
            Ok(repos)
        }
        ar_core::RepoTarget::Local => Ok(local_workspace_repos(ctx)),
        ar_core::RepoTarget::All => match ctx.gh.list_owner_repos(&ctx.config.github.owner).await {
            Ok(repos) => {
                ctx.store.replace_cached_repos(&repos)?;
                ctx.store.set_rate_limited_until(None)?;
                Ok(repos)
            }
            Err(GithubError::RateLimited) => {
                let until = now + Duration::minutes(RATE_LIMIT_BACKOFF_MINUTES);
                tracing::warn!(until = %until, "GitHub rate limited, using cached repo list");
                ctx.store.set_rate_limited_until(Some(until))?;
                let cached = ctx.store.cached_repos()?;
                if cached.is_empty() {
                    Ok(local_workspace_repos(ctx))
                } else {
                    Ok(cached)
                }
            }
            Err(e) => Err(e.into()),
        },
    }
}

/// Repositories present as git clones directly under the workdir root.
fn local_workspace_repos(ctx: &RunnerCtx) -> Vec<RepoRef> {
    let owner = &ctx.config.github.owner;
    let Ok(entries) = std::fs::read_dir(&ctx.config.workdir_root) else {
        return Vec::new();
    };
    let mut repos: Vec<RepoRef> = entries
        .flatten()
        .filter(|e| e.path().join(".git").exists())
        .filter_map(|e| e.file_name().into_string().ok())
        .map(|name| RepoRef::new(owner.clone(), name))
        .collect();
    repos.sort_by_key(|r| r.key());
    repos
}

/// Find new `/agent run` requests among the listed open issues.
///
/// Issues already running stay untouched; queued issues become candidates
/// again (they may have been left over when a previous cycle ran out of
/// slots). Errors on one issue never escape past it.
pub async fn discover_requests(
    ctx: &RunnerCtx,
    open_issues: &[Issue],
    now: DateTime<Utc>,
) -> Vec<QueuedCandidate> {
    let labels = &ctx.config.labels;
    let mut candidates = Vec::new();

    for issue in open_issues {
        let marks = labels.marks(&issue.labels);
        if marks.running || marks.needs_user_reply {
            continue;
        }
        if marks.queued {
            candidates.push(QueuedCandidate {
                issue: issue.clone(),
                enqueued_at: now,
                session: session_for(ctx, issue),
                resume_prompt: None,
            });
            continue;
        }

        match scan_issue_for_command(ctx, issue, now).await {
            Ok(Some(candidate)) => candidates.push(candidate),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(issue = %issue, error = %e, "command scan failed, skipping issue");
            }
        }
    }
    candidates
}

fn session_for(ctx: &RunnerCtx, issue: &Issue) -> Option<String> {
    ctx.store.session(issue.id).ok().flatten()
}

async fn scan_issue_for_command(
    ctx: &RunnerCtx,
    issue: &Issue,
    now: DateTime<Utc>,
) -> Result<Option<QueuedCandidate>, RunnerError> {
    let comments = ctx.gh.list_comments(&issue.repo, issue.number).await?;
    let mut fresh = None;
    for request in command_requests(&comments) {
        if ctx.store.record_command_comment(request.comment_id)? {
            fresh = Some(request);
        }
    }
    let Some(request) = fresh else {
        return Ok(None);
    };

    tracing::info!(
        issue = %issue,
        comment_id = request.comment_id,
        author = request.author.as_deref().unwrap_or("?"),
        "new /agent run request"
    );
    lifecycle::transition(&ctx.gh, &ctx.config.labels, issue, IssueState::Queued).await?;
    Ok(Some(QueuedCandidate {
        issue: issue.clone(),
        enqueued_at: now,
        session: session_for(ctx, issue),
        resume_prompt: None,
    }))
}

/// Consume due scheduled retries and re-queue them, keeping sessions.
pub async fn resume_retries(ctx: &RunnerCtx, now: DateTime<Utc>) -> Vec<QueuedCandidate> {
    let due = match ctx.store.take_due_retries(now) {
        Ok(due) => due,
        Err(e) => {
            tracing::error!(error = %e, "cannot take due retries");
            return Vec::new();
        }
    };
    let mut candidates = Vec::new();
    for retry in due {
        match ctx.gh.get_issue(&retry.repo, retry.issue_number).await {
            Ok(issue) => {
                if let Err(e) =
                    lifecycle::transition(&ctx.gh, &ctx.config.labels, &issue, IssueState::Queued)
                        .await
                {
                    tracing::warn!(issue = %issue, error = %e, "cannot re-queue retry");
                    continue;
                }
                tracing::info!(issue = %issue, "scheduled retry due, re-queued");
                candidates.push(QueuedCandidate {
                    issue,
                    enqueued_at: retry.run_after,
                    session: retry.session_id,
                    resume_prompt: None,
                });
            }
            Err(e) => {
                tracing::warn!(
                    repo = %retry.repo,
                    number = retry.issue_number,
                    error = %e,
                    "cannot fetch retried issue, dropping retry"
                );
            }
        }
    }
    candidates
}

/// Re-queue needs-user-reply issues that received a user comment.
pub async fn resume_user_replies(
    ctx: &RunnerCtx,
    open_issues: &[Issue],
    now: DateTime<Utc>,
) -> Vec<QueuedCandidate> {
    let labels = &ctx.config.labels;
    let mut candidates = Vec::new();
    for issue in open_issues {
        if !labels.marks(&issue.labels).needs_user_reply {
            continue;
        }
        let comments = match ctx.gh.list_comments(&issue.repo, issue.number).await {
            Ok(comments) => comments,
            Err(e) => {
                tracing::warn!(issue = %issue, error = %e, "cannot list comments for resume scan");
                continue;
            }
        };
        let Some(reply) = find_user_reply(&comments) else {
            continue;
        };
        if let Err(e) =
            lifecycle::transition(&ctx.gh, labels, issue, IssueState::Queued).await
        {
            tracing::warn!(issue = %issue, error = %e, "cannot re-queue answered issue");
            continue;
        }
        let _ = ctx.store.clear_retry(issue.id);
        tracing::info!(issue = %issue, reply_comment = reply.id, "user replied, re-queued");
        candidates.push(QueuedCandidate {
            issue: issue.clone(),
            enqueued_at: now,
            session: session_for(ctx, issue),
            resume_prompt: Some(reply.body.clone()),
        });
    }
    candidates
}

/// Drain the webhook queue into candidates.
pub async fn drain_webhook_queue(ctx: &RunnerCtx) -> Vec<QueuedCandidate> {
    let entries = match ctx.store.take_webhook_entries() {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!(error = %e, "cannot drain webhook queue");
            return Vec::new();
        }
    };
    let mut candidates = Vec::new();
    for entry in entries {
        match ctx.gh.get_issue(&entry.repo, entry.issue_number).await {
            Ok(issue) => {
                if let Err(e) = lifecycle::transition(
                    &ctx.gh,
                    &ctx.config.labels,
                    &issue,
                    IssueState::Queued,
                )
                .await
                {
                    tracing::warn!(issue = %issue, error = %e, "cannot label webhook request");
                }
                candidates.push(QueuedCandidate {
                    session: session_for(ctx, &issue),
                    issue,
                    enqueued_at: entry.enqueued_at,
                    resume_prompt: None,
                });
            }
            Err(e) => {
                tracing::warn!(
                    repo = %entry.repo,
                    number = entry.issue_number,
                    error = %e,
                    "cannot fetch webhook-queued issue"
                );
            }
        }
    }
    candidates
}

/// Webhook catch-up: periodically search for command comments received
/// while the listener was down.
pub async fn webhook_catchup(
    ctx: &RunnerCtx,
    repos: &[RepoRef],
    now: DateTime<Utc>,
) -> Vec<QueuedCandidate> {
    if !ctx.config.webhook.enabled {
        return Vec::new();
    }
    let interval = Duration::minutes(ctx.config.webhook.catchup_interval_minutes);
    let last = ctx.store.webhook_catchup_last_run().ok().flatten();
    if let Some(last) = last {
        if now - last < interval {
            return Vec::new();
        }
    }

    let mut candidates = Vec::new();
    for repo in repos {
        match ctx.gh.search_command_issues(repo, last).await {
            Ok(issues) => {
                for issue in issues {
                    match scan_issue_for_command(ctx, &issue, now).await {
                        Ok(Some(candidate)) => candidates.push(candidate),
                        Ok(None) => {}
                        Err(e) => {
                            tracing::warn!(issue = %issue, error = %e, "catch-up scan failed");
                        }
                    }
                }
            }
            Err(e) => tracing::warn!(repo = %repo, error = %e, "catch-up search failed"),
        }
    }
    if let Err(e) = ctx.store.set_webhook_catchup_last_run(now) {
        tracing::warn!(error = %e, "cannot store catch-up cursor");
    }
    candidates
}

/// Deduplicate by issue id (earliest enqueue wins) and order FIFO.
pub fn select_fifo(mut candidates: Vec<QueuedCandidate>, limit: usize) -> Vec<QueuedCandidate> {
    candidates.sort_by_key(|c| (c.enqueued_at, c.issue.id));
    let mut seen = std::collections::HashSet::new();
    candidates.retain(|c| seen.insert(c.issue.id));
    candidates.truncate(limit);
    candidates
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod tests;
