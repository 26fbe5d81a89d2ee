// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Session-id extraction from engine run logs.
//!
//! Each engine family prints its resumable session identifier in its own
//! format; the last match in the log wins.

use ar_core::EngineKind;
use regex::Regex;
use std::sync::OnceLock;

fn patterns(kind: EngineKind) -> &'static [Regex] {
    static CODEX: OnceLock<Vec<Regex>> = OnceLock::new();
    static CLAUDE: OnceLock<Vec<Regex>> = OnceLock::new();
    static COPILOT: OnceLock<Vec<Regex>> = OnceLock::new();
    static GEMINI: OnceLock<Vec<Regex>> = OnceLock::new();
    static AMAZON_Q: OnceLock<Vec<Regex>> = OnceLock::new();

    let compile = |patterns: &[&str]| -> Vec<Regex> {
        patterns.iter().filter_map(|p| Regex::new(p).ok()).collect()
    };

    match kind {
        EngineKind::Codex => CODEX.get_or_init(|| {
            compile(&[
                r"(?m)^\s*session id:\s*([0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})",
                r#""session_id"\s*:\s*"([^"]+)""#,
            ])
        }),
        EngineKind::Claude => CLAUDE.get_or_init(|| {
            compile(&[r#""session_id"\s*:\s*"([^"]+)""#])
        }),
        EngineKind::Copilot => COPILOT.get_or_init(|| {
            compile(&[r"(?im)^\s*session(?: id)?:\s*([A-Za-z0-9_-]{8,})"])
        }),
        EngineKind::GeminiPro | EngineKind::GeminiFlash => GEMINI.get_or_init(|| {
            compile(&[
                r"(?im)^\s*session id:\s*(\S+)",
                r#""sessionId"\s*:\s*"([^"]+)""#,
            ])
        }),
        EngineKind::AmazonQ => AMAZON_Q.get_or_init(|| {
            compile(&[r"(?im)^\s*conversation id:\s*([A-Za-z0-9-]+)"])
        }),
    }
}

/// Extract the engine session id from a run log, if one was emitted.
pub fn extract_session_id(kind: EngineKind, log: &str) -> Option<String> {
    let mut best: Option<(usize, String)> = None;
    for pattern in patterns(kind) {
        for captures in pattern.captures_iter(log) {
            if let Some(m) = captures.get(1) {
                let later = best.as_ref().map(|(pos, _)| m.start() >= *pos).unwrap_or(true);
                if later {
                    best = Some((m.start(), m.as_str().to_string()));
                }
            }
        }
    }
    best.map(|(_, id)| id)
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
