// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ar-core: Core library for the agent-runner scheduler
//!
//! Data model, configuration, and the pure decision logic (usage-gate
//! ramp, issue lifecycle label plans, run classification) shared by the
//! storage, GitHub, engine, and runner crates.

pub mod clock;
pub mod config;
pub mod engine;
pub mod id;
pub mod issue;
pub mod lifecycle;
pub mod records;
pub mod repo;
pub mod run;
pub mod usage;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{
    GatesConfig, GithubConfig, IdleConfig, RepoTarget, RetentionConfig, RunnerConfig,
    SchedulerConfig, ServiceLimits, TimeoutConfig, WebhookConfig,
};
pub use engine::{EngineKind, ServiceKind};
pub use id::RunId;
pub use issue::{Issue, IssueId};
pub use lifecycle::{IssueState, LabelMarks, LabelNames, LabelPlan};
pub use records::{
    ActivityKind, ActivityRecord, FollowupReason, IdleHistory, ReviewFollowupEntry, RetryReason,
    RunningRecord, ScheduledRetry, WebhookQueueEntry,
};
pub use repo::{RepoRef, RepoRefParseError};
pub use run::{
    extract_summary, FailureStage, RunStatus, NEEDS_REPLY_MARKER, SUMMARY_END, SUMMARY_START,
};
pub use usage::{
    evaluate_usage_gate, required_percent, DenyCause, GateConfig, GateDecision, RawWindow,
    UsageStatus, UsageWindow, WindowKind,
};
