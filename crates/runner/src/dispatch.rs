// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Dispatch frames: run one issue or one idle task end to end.
//!
//! Errors inside a frame are logged and settled against the issue; they
//! never escape to the cycle.

use ar_core::{
    ActivityKind, ActivityRecord, EngineKind, FailureStage, Issue, IssueState, RetryReason,
    RunId, RunStatus, RunningRecord, ScheduledRetry,
};
use ar_engines::{engine_for, TaskSpec};
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use std::path::Path;
use std::time::Duration as StdDuration;

use crate::context::RunnerCtx;
use crate::discovery::QueuedCandidate;
use crate::error::RunnerError;
use crate::exec::{self, ExecRequest};
use crate::gatekeeper;
use crate::idle::{render_idle_prompt, IdlePlan};
use crate::lifecycle;
use crate::limiter::RunPermit;
use crate::process::pid_alive;
use crate::worktree::{OwnerLiveness, Worktree, WorktreeManager};

/// Fallback quota back-off when the engine names no resume time.
const DEFAULT_QUOTA_BACKOFF_MINUTES: i64 = 60;
/// Same-session retry budget for after-session execution errors.
const MAX_SESSION_ATTEMPTS: u32 = 2;

/// Build the engine prompt for an issue run.
pub fn issue_prompt(issue: &Issue, resume_reply: Option<&str>) -> String {
    let mut prompt = format!(
        "You are working on GitHub issue {} ({}).\n\nTitle: {}\n",
        issue, issue.url, issue.title
    );
    if let Some(body) = &issue.body {
        if !body.trim().is_empty() {
            prompt.push_str("\nDescription:\n");
            prompt.push_str(body);
            prompt.push('\n');
        }
    }
    if let Some(reply) = resume_reply {
        prompt.push_str("\nThe user replied to your question:\n");
        prompt.push_str(reply);
        prompt.push('\n');
    }
    prompt.push_str(
        "\nWork in the current checkout. Commit your changes to the current branch \
         and push it; open a pull request when the change is ready.\n\
         Near the end of your run, print a block delimited by the literal lines \
         AGENT_RUNNER_SUMMARY_START and AGENT_RUNNER_SUMMARY_END summarizing what \
         you did. If you cannot proceed without an answer from the user, print \
         AGENT_RUNNER_NEEDS_USER_REPLY followed by your question inside the \
         summary block.\n",
    );
    prompt
}

/// Find a PR the run created in this repo (from its log output).
pub fn parse_created_pr(log: &str, repo: &ar_core::RepoRef) -> Option<u64> {
    let pattern = format!(
        r"(?i)https://github\.com/{}/{}/pull/(\d+)",
        regex::escape(&repo.owner),
        regex::escape(&repo.name)
    );
    let re = Regex::new(&pattern).ok()?;
    re.captures_iter(log).last()?.get(1)?.as_str().parse().ok()
}

/// Liveness probe for worktree conflict eviction: the path's owning run
/// is live only if some running record's pid is alive and its activity
/// points at this path's run directory.
fn worktree_owner_liveness(ctx: &RunnerCtx, path: &Path) -> OwnerLiveness {
    let run_dir = path.parent().and_then(|p| p.file_name()).and_then(|n| n.to_str());
    let Some(run_dir) = run_dir else {
        return OwnerLiveness::Dead;
    };
    let activities = match ctx.store.list_activity() {
        Ok(activities) => activities,
        Err(e) => {
            tracing::warn!(error = %e, "cannot read activity for liveness probe");
            return OwnerLiveness::Dead;
        }
    };
    for activity in activities {
        if activity.id.as_str() == run_dir {
            if pid_alive(activity.pid) {
                let what = match (activity.issue_number, &activity.task) {
                    (Some(n), _) => format!("issue {}#{n}", activity.repo),
                    (None, Some(task)) => format!("idle task {task:?} on {}", activity.repo),
                    (None, None) => format!("run on {}", activity.repo),
                };
                return OwnerLiveness::Live {
                    description: format!("{what} (pid {})", activity.pid),
                };
            }
            return OwnerLiveness::Dead;
        }
    }
    OwnerLiveness::Dead
}

/// Dispatch one issue run. Owns its error frame: any failure settles the
/// issue and returns.
pub async fn dispatch_issue(
    ctx: RunnerCtx,
    candidate: QueuedCandidate,
    engine: EngineKind,
    permit: RunPermit,
    now: DateTime<Utc>,
) {
    let issue = candidate.issue.clone();
    if let Err(e) = run_issue_inner(&ctx, candidate, engine, now).await {
        tracing::error!(issue = %issue, error = %e, "issue dispatch failed");
        if let Err(settle) = settle_dispatch_failure(&ctx, &issue, &e).await {
            tracing::error!(issue = %issue, error = %settle, "cannot settle failed dispatch");
        }
    }
    drop(permit);
}

/// Mark an issue failed after an orchestration error (worktree conflict,
/// spawn failure) without touching its stored session.
async fn settle_dispatch_failure(
    ctx: &RunnerCtx,
    issue: &Issue,
    error: &RunnerError,
) -> Result<(), RunnerError> {
    lifecycle::transition(&ctx.gh, &ctx.config.labels, issue, IssueState::FailedTerminal).await?;
    ctx.gh
        .create_comment(
            &issue.repo,
            issue.number,
            &lifecycle::comment_failed(&error.to_string()),
        )
        .await?;
    ctx.store.remove_running(issue.id)?;
    Ok(())
}

async fn checkout_for_issue(
    ctx: &RunnerCtx,
    wm: &WorktreeManager,
    issue: &Issue,
    run_id: &RunId,
    now: DateTime<Utc>,
) -> Result<Worktree, RunnerError> {
    wm.ensure_cache(&issue.repo).await?;
    wm.refresh_cache(&issue.repo).await?;

    if issue.is_pull_request && ctx.store.is_managed_pr(&issue.repo, issue.number)? {
        let pull = ctx.gh.get_pull(&issue.repo, issue.number).await?;
        let ctx_for_probe = ctx.clone();
        let liveness = move |path: &Path| worktree_owner_liveness(&ctx_for_probe, path);
        Ok(wm
            .create_for_remote_branch(&issue.repo, run_id, &pull.head.branch, &liveness)
            .await?)
    } else {
        Ok(wm.create_for_default_branch(&issue.repo, run_id, "issue", now).await?)
    }
}

async fn run_issue_inner(
    ctx: &RunnerCtx,
    candidate: QueuedCandidate,
    engine_kind: EngineKind,
    now: DateTime<Utc>,
) -> Result<(), RunnerError> {
    let issue = candidate.issue;
    lifecycle::transition(&ctx.gh, &ctx.config.labels, &issue, IssueState::Running).await?;

    let run_id = RunId::new();
    let wm = WorktreeManager::new(&ctx.config);
    let worktree = checkout_for_issue(ctx, &wm, &issue, &run_id, now).await?;

    let engine = engine_for(engine_kind);
    let mut session = candidate.session.clone();
    let mut attempt = 0u32;
    let prompt = issue_prompt(&issue, candidate.resume_prompt.as_deref());

    let outcome = loop {
        attempt += 1;
        let task = TaskSpec { prompt: prompt.clone(), resume_session: session.clone() };
        let req = ExecRequest {
            engine: engine_kind,
            invocation: engine.build_invocation(&task),
            cwd: worktree.path.clone(),
            log_path: ctx.config.logs_dir().join(exec::log_file_name(
                &issue.repo.name,
                Some(issue.number),
                Utc::now(),
            )),
            timeout: StdDuration::from_secs(ctx.config.timeouts.run_minutes * 60),
        };

        let spawned = exec::spawn_run(&req).await?;
        ctx.store.insert_running(&RunningRecord {
            issue_id: issue.id,
            issue_number: issue.number,
            repo: issue.repo.clone(),
            started_at: Utc::now(),
            pid: spawned.pid,
            log_path: req.log_path.clone(),
        })?;
        let activity = ActivityRecord {
            id: run_id,
            kind: ActivityKind::Issue,
            engine: engine_kind,
            repo: issue.repo.clone(),
            started_at: Utc::now(),
            pid: spawned.pid,
            log_path: req.log_path.clone(),
            issue_id: Some(issue.id),
            issue_number: Some(issue.number),
            task: None,
        };
        ctx.store.insert_activity(&activity)?;
        if engine_kind == EngineKind::AmazonQ {
            let _ = ctx.store.increment_amazon_q_usage(gatekeeper::day_start(now));
        }

        let outcome = exec::wait_run(&req, spawned, Utc::now()).await?;

        ctx.store.remove_running(issue.id)?;
        ctx.store.remove_activity(run_id)?;

        if let Some(new_session) = &outcome.session_id {
            ctx.store.set_session(issue.id, new_session, Utc::now())?;
            session = Some(new_session.clone());
        }

        let retry_same_session = matches!(
            outcome.status,
            RunStatus::ExecutionError { stage: FailureStage::AfterSession }
        ) && attempt < MAX_SESSION_ATTEMPTS
            && session.is_some();
        if retry_same_session {
            tracing::warn!(
                issue = %issue,
                attempt,
                "after-session failure, retrying against the same session"
            );
            continue;
        }
        break outcome;
    };

    publish_issue_outcome(ctx, &issue, &outcome, now).await?;
    wm.remove(&issue.repo, &worktree.path).await?;
    Ok(())
}

async fn publish_issue_outcome(
    ctx: &RunnerCtx,
    issue: &Issue,
    outcome: &exec::ExecOutcome,
    now: DateTime<Utc>,
) -> Result<(), RunnerError> {
    let labels = &ctx.config.labels;
    match &outcome.status {
        RunStatus::Success => {
            ctx.store.clear_session(issue.id)?;
            ctx.store.clear_retry(issue.id)?;
            if let Some(pr) = parse_created_pr(&outcome.log, &issue.repo) {
                tracing::info!(issue = %issue, pr, "run opened a managed PR");
                ctx.store.add_managed_pr(&issue.repo, pr)?;
            }
            lifecycle::transition(&ctx.gh, labels, issue, IssueState::Done).await?;
            ctx.gh
                .create_comment(
                    &issue.repo,
                    issue.number,
                    &lifecycle::comment_done(outcome.summary.as_deref()),
                )
                .await?;
        }
        RunStatus::Quota { resume_at } => {
            let run_after = resume_at
                .unwrap_or_else(|| now + Duration::minutes(DEFAULT_QUOTA_BACKOFF_MINUTES));
            let session_id = ctx.store.session(issue.id)?;
            ctx.store.upsert_retry(
                &ScheduledRetry {
                    issue_id: issue.id,
                    issue_number: issue.number,
                    repo: issue.repo.clone(),
                    run_after,
                    reason: RetryReason::Quota,
                    session_id,
                },
                now,
            )?;
            lifecycle::transition(&ctx.gh, labels, issue, IssueState::ScheduledRetry).await?;
            ctx.gh
                .create_comment(&issue.repo, issue.number, &lifecycle::comment_quota(run_after))
                .await?;
        }
        RunStatus::NeedsUserReply => {
            lifecycle::transition(&ctx.gh, labels, issue, IssueState::NeedsUserReply).await?;
            ctx.gh
                .create_comment(
                    &issue.repo,
                    issue.number,
                    &lifecycle::comment_needs_reply(outcome.summary.as_deref()),
                )
                .await?;
        }
        RunStatus::ExecutionError { .. } => {
            ctx.store.clear_session(issue.id)?;
            ctx.store.clear_retry(issue.id)?;
            lifecycle::transition(&ctx.gh, labels, issue, IssueState::FailedTerminal).await?;
            let detail =
                outcome.summary.clone().unwrap_or_else(|| exec::tail(&outcome.log, 20));
            ctx.gh
                .create_comment(&issue.repo, issue.number, &lifecycle::comment_failed(&detail))
                .await?;
        }
    }
    Ok(())
}

/// Dispatch one idle task. Owns its error frame.
pub async fn dispatch_idle(ctx: RunnerCtx, plan: IdlePlan, permit: RunPermit, now: DateTime<Utc>) {
    if let Err(e) = run_idle_inner(&ctx, &plan, now).await {
        tracing::error!(repo = %plan.repo, task = %plan.task, error = %e, "idle dispatch failed");
    }
    drop(permit);
}

async fn run_idle_inner(
    ctx: &RunnerCtx,
    plan: &IdlePlan,
    now: DateTime<Utc>,
) -> Result<(), RunnerError> {
    ctx.store.mark_idle(&plan.repo, now, plan.next_cursor)?;

    let run_id = RunId::new();
    let wm = WorktreeManager::new(&ctx.config);
    wm.ensure_cache(&plan.repo).await?;
    wm.refresh_cache(&plan.repo).await?;
    let worktree = wm.create_for_default_branch(&plan.repo, &run_id, "idle", now).await?;

    // Duplicate-work guard inputs; the list query is non-fatal.
    let open_prs = match ctx.gh.list_open_prs(&plan.repo).await {
        Ok(prs) => Some(prs),
        Err(e) => {
            tracing::warn!(repo = %plan.repo, error = %e, "open-PR query failed for idle guard");
            None
        }
    };
    let count = open_prs.as_ref().map(|prs| prs.len());
    let titles: Vec<(String, String)> = open_prs
        .unwrap_or_default()
        .into_iter()
        .map(|pr| (pr.title, pr.url))
        .collect();
    let prompt = render_idle_prompt(&plan.task, count, &titles);

    let engine = engine_for(plan.engine);
    let req = ExecRequest {
        engine: plan.engine,
        invocation: engine.build_invocation(&TaskSpec::fresh(prompt)),
        cwd: worktree.path.clone(),
        log_path: ctx
            .config
            .logs_dir()
            .join(exec::log_file_name(&plan.repo.name, None, Utc::now())),
        timeout: StdDuration::from_secs(ctx.config.timeouts.run_minutes * 60),
    };

    let spawned = exec::spawn_run(&req).await?;
    let activity = ActivityRecord {
        id: run_id,
        kind: ActivityKind::Idle,
        engine: plan.engine,
        repo: plan.repo.clone(),
        started_at: Utc::now(),
        pid: spawned.pid,
        log_path: req.log_path.clone(),
        issue_id: None,
        issue_number: None,
        task: Some(plan.task.clone()),
    };
    ctx.store.insert_activity(&activity)?;
    if plan.engine == EngineKind::AmazonQ {
        let _ = ctx.store.increment_amazon_q_usage(gatekeeper::day_start(now));
    }

    let outcome = exec::wait_run(&req, spawned, Utc::now()).await?;
    ctx.store.remove_activity(run_id)?;

    write_idle_report(ctx, plan, &outcome, now)?;
    if let Some(pr) = parse_created_pr(&outcome.log, &plan.repo) {
        tracing::info!(repo = %plan.repo, pr, "idle run opened a managed PR");
        ctx.store.add_managed_pr(&plan.repo, pr)?;
    }

    wm.remove(&plan.repo, &worktree.path).await?;
    Ok(())
}

fn write_idle_report(
    ctx: &RunnerCtx,
    plan: &IdlePlan,
    outcome: &exec::ExecOutcome,
    now: DateTime<Utc>,
) -> Result<(), RunnerError> {
    let reports_dir = ctx.config.reports_dir();
    std::fs::create_dir_all(&reports_dir)?;
    let path = reports_dir.join(format!("{}-idle-{}.md", plan.repo.name, now.timestamp()));
    let body = format!(
        "# Idle run: {}\n\n- engine: {}\n- task: {}\n- outcome: {:?}\n\n## Summary\n\n{}\n",
        plan.repo,
        plan.engine,
        plan.task,
        outcome.status,
        outcome
            .summary
            .clone()
            .unwrap_or_else(|| exec::tail(&outcome.log, 40)),
    );
    std::fs::write(&path, body)?;
    tracing::info!(report = %path.display(), "idle report written");
    Ok(())
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
