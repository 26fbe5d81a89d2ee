// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! `agent-runner stop` / `resume` - touch the stop flag

use ar_core::RunnerConfig;
use ar_runner::StopFlag;

pub fn stop(config: RunnerConfig) -> anyhow::Result<()> {
    let flag = StopFlag::new(&config.state_dir());
    flag.set()?;
    println!("stop requested; in-flight runs will drain, no new work will start");
    Ok(())
}

pub fn resume(config: RunnerConfig) -> anyhow::Result<()> {
    let flag = StopFlag::new(&config.state_dir());
    flag.clear()?;
    println!("stop flag cleared; the loop will schedule again on its next tick");
    Ok(())
}
