// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! `agent-runner logs prune` / `reports prune` - retention sweeps

use ar_core::RunnerConfig;
use ar_runner::prune::prune_older_than;
use std::path::Path;

use super::require_confirmation;
use crate::ConfirmArgs;

fn prune(dir: &Path, days: i64, args: &ConfirmArgs, what: &str) -> anyhow::Result<()> {
    require_confirmation(args.yes, args.dry_run)?;
    let affected = prune_older_than(dir, days, chrono::Utc::now(), args.dry_run)?;
    let verb = if args.dry_run { "would delete" } else { "deleted" };
    for path in &affected {
        println!("{verb} {}", path.display());
    }
    println!("{verb} {} {what} file(s) older than {days}d", affected.len());
    Ok(())
}

pub fn logs(config: RunnerConfig, args: ConfirmArgs) -> anyhow::Result<()> {
    prune(&config.logs_dir(), config.retention.log_days, &args, "log")
}

pub fn reports(config: RunnerConfig, args: ConfirmArgs) -> anyhow::Result<()> {
    prune(&config.reports_dir(), config.retention.report_days, &args, "report")
}
