// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

use super::*;

#[test]
fn own_pid_is_alive() {
    assert!(pid_alive(std::process::id()));
}

#[test]
fn absurd_pid_is_dead() {
    // Far above any default pid_max.
    assert!(!pid_alive(4_190_000));
}

#[tokio::test]
async fn bounded_command_completes() {
    let mut cmd = tokio::process::Command::new("true");
    cmd.stdout(std::process::Stdio::null());
    let output = run_with_timeout(cmd, Duration::from_secs(5), "true").await.unwrap();
    assert!(output.status.success());
}

#[tokio::test]
async fn bounded_command_times_out() {
    let mut cmd = tokio::process::Command::new("sleep");
    cmd.arg("5");
    let result = run_with_timeout(cmd, Duration::from_millis(50), "sleep").await;
    assert!(matches!(result, Err(SubprocessError::Timeout { .. })));
}
