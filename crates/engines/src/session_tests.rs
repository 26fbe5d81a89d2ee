// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

use super::*;

#[test]
fn codex_banner_session_id() {
    let log = "workdir: /tmp/wt\nsession id: 0195a2b4-7c3d-4e5f-8a9b-0c1d2e3f4a5b\nmodel: o4\n";
    assert_eq!(
        extract_session_id(EngineKind::Codex, log).as_deref(),
        Some("0195a2b4-7c3d-4e5f-8a9b-0c1d2e3f4a5b")
    );
}

#[test]
fn codex_jsonl_session_id() {
    let log = r#"{"type":"turn","session_id":"abc-123","msg":"hi"}"#;
    assert_eq!(extract_session_id(EngineKind::Codex, log).as_deref(), Some("abc-123"));
}

#[test]
fn last_occurrence_wins() {
    let log = "session id: 00000000-0000-0000-0000-000000000001\nretrying\nsession id: 00000000-0000-0000-0000-000000000002\n";
    assert_eq!(
        extract_session_id(EngineKind::Codex, log).as_deref(),
        Some("00000000-0000-0000-0000-000000000002")
    );
}

#[test]
fn claude_session_from_json_output() {
    let log = r#"{"result":"ok","session_id":"s-claude-1"}"#;
    assert_eq!(extract_session_id(EngineKind::Claude, log).as_deref(), Some("s-claude-1"));
}

#[test]
fn gemini_session_forms() {
    let banner = "Loaded model gemini-2.5-pro\nSession ID: gem_42\n";
    assert_eq!(extract_session_id(EngineKind::GeminiPro, banner).as_deref(), Some("gem_42"));
    let json = r#"{"sessionId":"gem_43"}"#;
    assert_eq!(extract_session_id(EngineKind::GeminiFlash, json).as_deref(), Some("gem_43"));
}

#[test]
fn amazon_q_conversation_id() {
    let log = "Conversation ID: 0f0e0d0c-1234\n";
    assert_eq!(extract_session_id(EngineKind::AmazonQ, log).as_deref(), Some("0f0e0d0c-1234"));
}

#[test]
fn absent_session_yields_none() {
    assert_eq!(extract_session_id(EngineKind::Copilot, "no ids here"), None);
}
