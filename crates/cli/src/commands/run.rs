// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! `agent-runner run` - the scheduling loop

use ar_core::RunnerConfig;
use ar_github::GithubClient;
use ar_runner::{Runner, RunnerCtx, StatusSnapshot, StopFlag};
use ar_storage::StateStore;
use std::time::Duration;

use super::require_confirmation;
use crate::RunArgs;

pub async fn run(mut config: RunnerConfig, args: RunArgs) -> anyhow::Result<()> {
    if let Some(interval) = args.interval {
        config.scheduler.interval_secs = interval;
    }
    if let Some(concurrency) = args.concurrency {
        config.scheduler.concurrency = concurrency;
    }

    if args.dry_run {
        return dry_run(&config, args.json);
    }
    require_confirmation(args.yes, args.dry_run)?;

    let store = StateStore::open(&config.state_dir())?;
    let gh = GithubClient::from_env(Duration::from_secs(config.timeouts.github_secs)).await?;
    let interval = Duration::from_secs(config.scheduler.interval_secs);
    let ctx = RunnerCtx::new(config, store, gh);
    let runner = Runner::new(ctx);

    runner.run_loop(args.once, interval).await?;

    if args.json {
        let snapshot = StatusSnapshot::gather(
            runner.ctx().store.as_ref(),
            &StopFlag::new(&runner.ctx().config.state_dir()),
            chrono::Utc::now(),
        )?;
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }
    Ok(())
}

/// Dry run: show the resolved scheduling inputs without touching GitHub
/// or spawning anything.
fn dry_run(config: &RunnerConfig, json: bool) -> anyhow::Result<()> {
    let store = StateStore::open(&config.state_dir())?;
    let stop = StopFlag::new(&config.state_dir());
    let snapshot = StatusSnapshot::gather(&store, &stop, chrono::Utc::now())?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "dry_run": true,
                "repos": config.github.repos,
                "concurrency": config.scheduler.concurrency,
                "interval_secs": config.scheduler.interval_secs,
                "issue_engines": config.scheduler.issue_engines,
                "idle_enabled": config.idle.enabled,
                "status": snapshot,
            }))?
        );
    } else {
        println!("dry run: no work will be dispatched");
        println!("repos target: {:?}", config.github.repos);
        println!(
            "concurrency: {} (interval {}s)",
            config.scheduler.concurrency, config.scheduler.interval_secs
        );
        print!("{}", snapshot.render_text());
    }
    Ok(())
}
