// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Runner configuration (TOML file + defaults)

use crate::engine::EngineKind;
use crate::lifecycle::LabelNames;
use crate::usage::GateConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Which repositories the scheduler drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoTarget {
    /// An explicit `owner/name` list.
    List(Vec<String>),
    /// Every repository of the configured owner.
    All,
    /// Repositories present in the local workspace directory.
    Local,
}

impl Default for RepoTarget {
    fn default() -> Self {
        RepoTarget::Local
    }
}

impl Serialize for RepoTarget {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RepoTarget::List(list) => list.serialize(serializer),
            RepoTarget::All => "all".serialize(serializer),
            RepoTarget::Local => "local".serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for RepoTarget {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Keyword(String),
            List(Vec<String>),
        }
        match Wire::deserialize(deserializer)? {
            Wire::List(list) => Ok(RepoTarget::List(list)),
            Wire::Keyword(k) if k == "all" => Ok(RepoTarget::All),
            Wire::Keyword(k) if k == "local" => Ok(RepoTarget::Local),
            Wire::Keyword(k) => Err(serde::de::Error::custom(format!(
                "invalid repo target {k:?}: expected a list, \"all\", or \"local\""
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// The user or organization whose repositories are driven.
    pub owner: String,
    pub repos: RepoTarget,
    /// Logins treated as our own bot identity when scanning comments.
    pub bot_logins: Vec<String>,
    /// Bot principals whose PR reviews are still acted on.
    pub recognized_review_bots: Vec<String>,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repos: RepoTarget::default(),
            bot_logins: vec!["agent-runner[bot]".to_string()],
            recognized_review_bots: vec![
                "coderabbitai[bot]".to_string(),
                "copilot-pull-request-reviewer[bot]".to_string(),
            ],
        }
    }
}

/// Per-service concurrency caps (§ concurrency gate, second limiter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceLimits {
    pub codex: usize,
    pub copilot: usize,
    pub gemini: usize,
    pub amazon_q: usize,
    pub claude: usize,
}

impl Default for ServiceLimits {
    fn default() -> Self {
        Self { codex: 1, copilot: 1, gemini: 1, amazon_q: 1, claude: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between cycles in loop mode.
    pub interval_secs: u64,
    /// Global cap on parallel runs of any kind.
    pub concurrency: usize,
    /// Engine preference order for issue runs; the first gate-allowed
    /// engine wins.
    pub issue_engines: Vec<EngineKind>,
    pub service_limits: ServiceLimits,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            concurrency: 2,
            issue_engines: vec![
                EngineKind::Codex,
                EngineKind::Claude,
                EngineKind::Copilot,
                EngineKind::GeminiPro,
                EngineKind::AmazonQ,
            ],
            service_limits: ServiceLimits::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdleConfig {
    pub enabled: bool,
    /// A repo is ineligible for idle work this long after its last idle run.
    pub cooldown_minutes: i64,
    /// Cap on idle dispatches per cycle; raised when more engines are
    /// allowed so each gets one task.
    pub max_runs_per_cycle: usize,
    /// Engines eligible for idle work, assigned round-robin.
    pub engines: Vec<EngineKind>,
    /// Task prompts drawn round-robin per repo.
    pub tasks: Vec<String>,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown_minutes: 12 * 60,
            max_runs_per_cycle: 1,
            engines: vec![EngineKind::GeminiPro, EngineKind::GeminiFlash],
            tasks: vec![
                "Review open issues and fix the most impactful small bug.".to_string(),
                "Improve test coverage for the least-tested module.".to_string(),
                "Update stale documentation to match current behavior.".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatesConfig {
    pub codex: GateConfig,
    pub copilot: GateConfig,
    pub gemini: GateConfig,
    pub amazon_q: GateConfig,
    pub claude: GateConfig,
    /// Cool-down between Gemini warm-up grants, per model.
    pub gemini_warmup_cooldown_minutes: i64,
    /// Synthetic daily request cap used to derive Amazon Q usage windows.
    pub amazon_q_daily_cap: u32,
}

impl Default for GatesConfig {
    fn default() -> Self {
        Self {
            codex: GateConfig::default(),
            copilot: GateConfig::default(),
            gemini: GateConfig::default(),
            amazon_q: GateConfig::default(),
            claude: GateConfig::default(),
            gemini_warmup_cooldown_minutes: 24 * 60,
            amazon_q_daily_cap: 50,
        }
    }
}

impl GatesConfig {
    pub fn for_engine(&self, kind: EngineKind) -> &GateConfig {
        match kind {
            EngineKind::Codex => &self.codex,
            EngineKind::Copilot => &self.copilot,
            EngineKind::GeminiPro | EngineKind::GeminiFlash => &self.gemini,
            EngineKind::AmazonQ => &self.amazon_q,
            EngineKind::Claude => &self.claude,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub enabled: bool,
    /// Shared secret for HMAC signature verification.
    pub secret: Option<String>,
    /// How often the poll cycle searches for command comments missed while
    /// the webhook listener was down.
    pub catchup_interval_minutes: i64,
    pub max_body_bytes: usize,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            secret: None,
            catchup_interval_minutes: 30,
            max_body_bytes: 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub log_days: i64,
    pub report_days: i64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self { log_days: 14, report_days: 30 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Quota backend reads.
    pub usage_secs: u64,
    /// GitHub API calls.
    pub github_secs: u64,
    /// Individual git subprocess invocations.
    pub git_secs: u64,
    /// One engine run, end to end.
    pub run_minutes: u64,
    /// Waiting on the per-repo git-cache lock.
    pub cache_lock_minutes: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            usage_secs: 20,
            github_secs: 30,
            git_secs: 600,
            run_minutes: 60,
            cache_lock_minutes: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub workdir_root: PathBuf,
    pub github: GithubConfig,
    pub scheduler: SchedulerConfig,
    pub labels: LabelNames,
    pub idle: IdleConfig,
    pub gates: GatesConfig,
    pub webhook: WebhookConfig,
    pub retention: RetentionConfig,
    pub timeouts: TimeoutConfig,
}

impl RunnerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        toml::from_str(&text)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Root of everything the runner persists.
    pub fn runner_root(&self) -> PathBuf {
        self.workdir_root.join("agent-runner")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.runner_root().join("state")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.runner_root().join("logs")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.runner_root().join("reports")
    }

    pub fn git_cache_dir(&self) -> PathBuf {
        self.runner_root().join("git-cache")
    }

    pub fn work_dir(&self) -> PathBuf {
        self.runner_root().join("work")
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
