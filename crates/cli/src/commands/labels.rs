// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! `agent-runner labels sync` - create/update agent labels on target repos

use ar_core::RunnerConfig;
use ar_github::GithubClient;
use ar_runner::{discovery, RunnerCtx};
use ar_storage::StateStore;
use std::time::Duration;

use super::require_confirmation;
use crate::ConfirmArgs;

/// Label name, color, description for the five agent labels.
fn label_specs(config: &RunnerConfig) -> Vec<(String, &'static str, &'static str)> {
    let labels = &config.labels;
    vec![
        (labels.queued.clone(), "ededed", "Queued for an agent run"),
        (labels.running.clone(), "1d76db", "An agent run is in progress"),
        (labels.done.clone(), "0e8a16", "Agent run finished"),
        (labels.failed.clone(), "d93f0b", "Agent run failed"),
        (labels.needs_user_reply.clone(), "fbca04", "The agent needs your input"),
    ]
}

pub async fn sync(config: RunnerConfig, args: ConfirmArgs) -> anyhow::Result<()> {
    require_confirmation(args.yes, args.dry_run)?;

    let store = StateStore::open(&config.state_dir())?;
    let gh = GithubClient::from_env(Duration::from_secs(config.timeouts.github_secs)).await?;
    let ctx = RunnerCtx::new(config, store, gh);
    let repos = discovery::discover_repos(&ctx, chrono::Utc::now()).await?;
    let specs = label_specs(&ctx.config);

    for repo in &repos {
        for (name, color, description) in &specs {
            if args.dry_run {
                println!("would ensure label {name:?} ({color}) on {repo}");
                continue;
            }
            match ctx.gh.ensure_label(repo, name, color, description).await {
                Ok(()) => println!("ensured label {name:?} on {repo}"),
                Err(e) => eprintln!("warning: label {name:?} on {repo}: {e}"),
            }
        }
    }
    Ok(())
}
