// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ar-github: GitHub adapter for the agent-runner scheduler
//!
//! Read-side queries, write-side mutations, the `/agent run` command
//! protocol, review classification, and webhook signature verification.
//! Transport and auth go through octocrab; the payload slices we care
//! about are deserialized into our own wire types.

pub mod client;
pub mod command;
mod error;
pub mod issues;
pub mod pulls;
pub mod reviews;
pub mod webhook;
pub mod wire;

pub use client::{resolve_token, GithubClient, NotifyApp};
pub use command::{command_requests, is_authorized_association, parse_agent_command, CommandRequest};
pub use error::GithubError;
pub use issues::IssueComment;
pub use reviews::{is_approval_phrase, ReviewEvent};
pub use webhook::{classify_event, verify_signature, WebhookAction};
