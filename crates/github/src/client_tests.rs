// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

use super::*;
use serial_test::serial;

#[test]
#[serial]
fn token_chain_prefers_agent_token() {
    std::env::set_var("AGENT_GITHUB_TOKEN", "agent-tok");
    std::env::set_var("GITHUB_TOKEN", "gh-tok");
    std::env::set_var("GH_TOKEN", "cli-tok");
    assert_eq!(resolve_token().as_deref(), Some("agent-tok"));

    std::env::remove_var("AGENT_GITHUB_TOKEN");
    assert_eq!(resolve_token().as_deref(), Some("gh-tok"));

    std::env::remove_var("GITHUB_TOKEN");
    assert_eq!(resolve_token().as_deref(), Some("cli-tok"));

    std::env::remove_var("GH_TOKEN");
    assert_eq!(resolve_token(), None);
}

#[test]
#[serial]
fn blank_tokens_are_skipped() {
    std::env::set_var("AGENT_GITHUB_TOKEN", "   ");
    std::env::set_var("GITHUB_TOKEN", "real");
    assert_eq!(resolve_token().as_deref(), Some("real"));
    std::env::remove_var("AGENT_GITHUB_TOKEN");
    std::env::remove_var("GITHUB_TOKEN");
}

#[test]
#[serial]
fn notify_app_requires_all_three_vars() {
    std::env::set_var("AGENT_GITHUB_NOTIFY_APP_ID", "12345");
    std::env::set_var("AGENT_GITHUB_NOTIFY_APP_INSTALLATION_ID", "678");
    std::env::remove_var("AGENT_GITHUB_NOTIFY_APP_PRIVATE_KEY_PATH");
    assert!(NotifyApp::from_env().is_none());

    std::env::set_var("AGENT_GITHUB_NOTIFY_APP_PRIVATE_KEY_PATH", "/tmp/key.pem");
    let app = NotifyApp::from_env().unwrap();
    assert_eq!(app.app_id, 12345);
    assert_eq!(app.installation_id, 678);

    std::env::remove_var("AGENT_GITHUB_NOTIFY_APP_ID");
    std::env::remove_var("AGENT_GITHUB_NOTIFY_APP_INSTALLATION_ID");
    std::env::remove_var("AGENT_GITHUB_NOTIFY_APP_PRIVATE_KEY_PATH");
}
