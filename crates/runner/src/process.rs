// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Subprocess helpers: bounded execution and pid liveness.

use std::process::Output;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum SubprocessError {
    #[error("{what} failed to spawn: {source}")]
    Spawn {
        what: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{what} timed out after {seconds}s")]
    Timeout { what: String, seconds: u64 },
    #[error("{what} wait failed: {source}")]
    Wait {
        what: String,
        #[source]
        source: std::io::Error,
    },
}

/// Run a command to completion with a hard timeout, capturing output.
pub async fn run_with_timeout(
    mut cmd: tokio::process::Command,
    timeout: Duration,
    what: &str,
) -> Result<Output, SubprocessError> {
    cmd.kill_on_drop(true);
    let fut = cmd.output();
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(source)) => Err(SubprocessError::Spawn { what: what.to_string(), source }),
        Err(_) => Err(SubprocessError::Timeout {
            what: what.to_string(),
            seconds: timeout.as_secs(),
        }),
    }
}

/// True when a pid names a live process (signal 0 probe).
pub fn pid_alive(pid: u32) -> bool {
    let Ok(pid) = i32::try_from(pid) else {
        return false;
    };
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), None).is_ok()
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
