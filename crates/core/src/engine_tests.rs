// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

use super::*;

#[yare::parameterized(
    codex = { "codex", EngineKind::Codex },
    copilot = { "copilot", EngineKind::Copilot },
    gemini_pro = { "gemini-pro", EngineKind::GeminiPro },
    gemini_flash = { "gemini-flash", EngineKind::GeminiFlash },
    amazon_q = { "amazon-q", EngineKind::AmazonQ },
    claude = { "claude", EngineKind::Claude },
)]
fn parse_roundtrips(s: &str, kind: EngineKind) {
    assert_eq!(s.parse::<EngineKind>().unwrap(), kind);
    assert_eq!(kind.as_str(), s);
}

#[test]
fn unknown_engine_is_rejected() {
    assert!("gpt-5".parse::<EngineKind>().is_err());
}

#[test]
fn gemini_variants_share_a_service() {
    assert_eq!(EngineKind::GeminiPro.service(), ServiceKind::Gemini);
    assert_eq!(EngineKind::GeminiFlash.service(), ServiceKind::Gemini);
    assert_ne!(EngineKind::Codex.service(), ServiceKind::Gemini);
}

#[test]
fn serde_uses_kebab_case() {
    let json = serde_json::to_string(&EngineKind::AmazonQ).unwrap();
    assert_eq!(json, "\"amazon-q\"");
    let back: EngineKind = serde_json::from_str(&json).unwrap();
    assert_eq!(back, EngineKind::AmazonQ);
}
