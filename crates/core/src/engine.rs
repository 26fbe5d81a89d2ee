// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Engine identity and service-family routing

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A concrete engine variant the scheduler can dispatch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineKind {
    Codex,
    Copilot,
    GeminiPro,
    GeminiFlash,
    AmazonQ,
    Claude,
}

/// Service family for per-service concurrency limiting.
///
/// The two Gemini variants share one family so a slow Pro run cannot be
/// bypassed by scheduling Flash alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceKind {
    Codex,
    Copilot,
    Gemini,
    AmazonQ,
    Claude,
}

impl EngineKind {
    pub const ALL: [EngineKind; 6] = [
        EngineKind::Codex,
        EngineKind::Copilot,
        EngineKind::GeminiPro,
        EngineKind::GeminiFlash,
        EngineKind::AmazonQ,
        EngineKind::Claude,
    ];

    pub fn service(&self) -> ServiceKind {
        match self {
            EngineKind::Codex => ServiceKind::Codex,
            EngineKind::Copilot => ServiceKind::Copilot,
            EngineKind::GeminiPro | EngineKind::GeminiFlash => ServiceKind::Gemini,
            EngineKind::AmazonQ => ServiceKind::AmazonQ,
            EngineKind::Claude => ServiceKind::Claude,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Codex => "codex",
            EngineKind::Copilot => "copilot",
            EngineKind::GeminiPro => "gemini-pro",
            EngineKind::GeminiFlash => "gemini-flash",
            EngineKind::AmazonQ => "amazon-q",
            EngineKind::Claude => "claude",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown engine {input:?}")]
pub struct EngineParseError {
    pub input: String,
}

impl FromStr for EngineKind {
    type Err = EngineParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "codex" => Ok(EngineKind::Codex),
            "copilot" => Ok(EngineKind::Copilot),
            "gemini-pro" => Ok(EngineKind::GeminiPro),
            "gemini-flash" => Ok(EngineKind::GeminiFlash),
            "amazon-q" => Ok(EngineKind::AmazonQ),
            "claude" => Ok(EngineKind::Claude),
            _ => Err(EngineParseError { input: s.to_string() }),
        }
    }
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 5] = [
        ServiceKind::Codex,
        ServiceKind::Copilot,
        ServiceKind::Gemini,
        ServiceKind::AmazonQ,
        ServiceKind::Claude,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Codex => "codex",
            ServiceKind::Copilot => "copilot",
            ServiceKind::Gemini => "gemini",
            ServiceKind::AmazonQ => "amazon-q",
            ServiceKind::Claude => "claude",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
