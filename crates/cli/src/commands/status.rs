// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! `agent-runner status` - print a status snapshot

use ar_core::RunnerConfig;
use ar_runner::{StatusSnapshot, StopFlag};
use ar_storage::StateStore;

pub fn status(config: RunnerConfig, json: bool) -> anyhow::Result<()> {
    let store = StateStore::open(&config.state_dir())?;
    let stop = StopFlag::new(&config.state_dir());
    let snapshot = StatusSnapshot::gather(&store, &stop, chrono::Utc::now())?;
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", snapshot.render_text());
    }
    Ok(())
}
