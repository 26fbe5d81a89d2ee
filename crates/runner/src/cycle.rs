// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! The cycle driver: one `run_cycle` per tick, steps in strict order.
//!
//! Step errors that concern a single issue stay inside its dispatch
//! frame; discovery or store errors abort the cycle, which the loop logs
//! and retries on the next tick.

use ar_core::{Clock, IssueId, SystemClock};
use ar_storage::RunnerLock;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::time::Duration;

use crate::context::RunnerCtx;
use crate::discovery;
use crate::dispatch;
use crate::error::RunnerError;
use crate::followup;
use crate::gatekeeper;
use crate::idle;
use crate::recovery;
use crate::stopflag::StopFlag;

pub struct Runner<C: Clock = SystemClock> {
    ctx: RunnerCtx,
    clock: C,
    stop: StopFlag,
}

impl Runner<SystemClock> {
    pub fn new(ctx: RunnerCtx) -> Self {
        Self::with_clock(ctx, SystemClock)
    }
}

impl<C: Clock> Runner<C> {
    pub fn with_clock(ctx: RunnerCtx, clock: C) -> Self {
        let stop = StopFlag::new(&ctx.config.state_dir());
        Self { ctx, clock, stop }
    }

    pub fn ctx(&self) -> &RunnerCtx {
        &self.ctx
    }

    /// Run the scheduling loop (or one cycle with `once`).
    ///
    /// The runner singleton lock guards the whole loop. In `--once` mode
    /// an already-held lock is a clean no-op exit; in loop mode we wait a
    /// tick and try again.
    pub async fn run_loop(&self, once: bool, interval: Duration) -> Result<(), RunnerError> {
        let state_dir = self.ctx.config.state_dir();
        let _lock = loop {
            match RunnerLock::acquire(&state_dir)? {
                Some(lock) => break lock,
                None if once => {
                    tracing::info!("another runner holds the lock; nothing to do");
                    return Ok(());
                }
                None => {
                    tracing::info!("another runner holds the lock; retrying next tick");
                    tokio::time::sleep(interval).await;
                }
            }
        };

        loop {
            if self.stop.is_set() {
                tracing::info!("stop requested; not scheduling new work");
                break;
            }
            let now = self.clock.now();
            if let Err(e) = self.run_cycle(now).await {
                tracing::error!(error = %e, "cycle failed; continuing on next tick");
            }
            if once {
                break;
            }
            tokio::time::sleep(interval).await;
        }
        Ok(())
    }

    /// One scheduling pass. Steps run strictly in order; all dispatched
    /// work terminates before this returns.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> Result<(), RunnerError> {
        let ctx = &self.ctx;
        tracing::debug!(now = %now, "cycle start");

        // 1. Repo discovery (rate-limit falls back to the cached list).
        let repos = discovery::discover_repos(ctx, now).await?;

        let mut open_issues = Vec::new();
        for repo in &repos {
            match ctx.gh.list_open_issues(repo).await {
                Ok(mut issues) => open_issues.append(&mut issues),
                Err(e) => tracing::warn!(repo = %repo, error = %e, "issue listing failed"),
            }
        }

        // 2. Crash recovery.
        recovery::recover_stalled(ctx, &open_issues).await?;

        // 3. User-reply resumption.
        let mut candidates = discovery::resume_user_replies(ctx, &open_issues, now).await;

        // 4. Scheduled-retry resumption.
        candidates.extend(discovery::resume_retries(ctx, now).await);

        // 5. Webhook catch-up, then the live webhook queue.
        candidates.extend(discovery::webhook_catchup(ctx, &repos, now).await);
        candidates.extend(discovery::drain_webhook_queue(ctx).await);

        // 6. New-request discovery.
        candidates.extend(discovery::discover_requests(ctx, &open_issues, now).await);

        // 7. Managed-PR follow-up scan.
        followup::scan_managed_prs(ctx).await;

        // 8. Selection: fill the slack left by currently running work.
        let running = ctx.store.list_activity()?.len();
        let capacity = ctx.config.scheduler.concurrency.saturating_sub(running);
        let running_ids: HashSet<IssueId> =
            ctx.store.list_running()?.into_iter().map(|r| r.issue_id).collect();
        candidates.retain(|c| !running_ids.contains(&c.issue.id));
        let selected = discovery::select_fifo(candidates, capacity);

        // 10. Dispatch selected issues concurrently.
        let mut joins: Vec<tokio::task::JoinHandle<()>> = Vec::new();
        let mut dispatched = 0usize;
        for candidate in selected {
            let Some(engine) = gatekeeper::pick_issue_engine(ctx, now).await else {
                tracing::warn!("no engine within quota; queued issues wait");
                break;
            };
            let Some(permit) = ctx.gate.try_acquire(engine.service()) else {
                break;
            };
            joins.push(tokio::spawn(dispatch::dispatch_issue(
                ctx.clone(),
                candidate,
                engine,
                permit,
                now,
            )));
            dispatched += 1;
        }

        // 9. Idle branch: follow-ups first, then idle planning.
        let slack = capacity.saturating_sub(dispatched);
        let engine_followups = followup::drain_followups(ctx, now, slack, &mut joins).await;
        let slack = slack.saturating_sub(engine_followups);
        if slack > 0 && ctx.config.idle.enabled {
            let allowed = gatekeeper::allowed_idle_engines(ctx, now).await;
            if !allowed.is_empty() {
                let mut histories = Vec::new();
                for repo in &repos {
                    match ctx.store.idle_history(repo) {
                        Ok(history) => histories.push(history),
                        Err(e) => {
                            tracing::warn!(repo = %repo, error = %e, "idle history read failed");
                        }
                    }
                }
                for plan in idle::plan_idle(now, &ctx.config.idle, &histories, &allowed, slack) {
                    let Some(permit) = ctx.gate.try_acquire(plan.engine.service()) else {
                        break;
                    };
                    joins.push(tokio::spawn(dispatch::dispatch_idle(
                        ctx.clone(),
                        plan,
                        permit,
                        now,
                    )));
                }
            }
        }

        // All dispatched tasks terminate before the cycle returns.
        for join in joins {
            if let Err(e) = join.await {
                tracing::error!(error = %e, "dispatch task panicked");
            }
        }
        tracing::debug!("cycle end");
        Ok(())
    }
}
