// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! The `/agent run` issue-comment protocol.
//!
//! The trigger is the literal `/agent run` on its own line, in a comment
//! authored by a principal whose association is owner, member, or
//! collaborator. Comment ids are recorded by the caller to deduplicate
//! across cycles.

use crate::issues::IssueComment;

pub const AGENT_RUN_COMMAND: &str = "/agent run";

/// A command comment that passed the protocol checks.
#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub comment_id: u64,
    pub author: Option<String>,
}

/// True when the comment body contains `/agent run` on its own line.
pub fn parse_agent_command(body: &str) -> bool {
    body.lines().any(|line| line.trim() == AGENT_RUN_COMMAND)
}

/// True for author associations allowed to trigger runs.
pub fn is_authorized_association(association: Option<&str>) -> bool {
    matches!(association, Some("OWNER") | Some("MEMBER") | Some("COLLABORATOR"))
}

/// Filter comments down to valid command requests, oldest first.
pub fn command_requests(comments: &[IssueComment]) -> Vec<CommandRequest> {
    comments
        .iter()
        .filter(|c| !c.author_is_bot)
        .filter(|c| is_authorized_association(c.author_association.as_deref()))
        .filter(|c| parse_agent_command(&c.body))
        .map(|c| CommandRequest { comment_id: c.id, author: c.author.clone() })
        .collect()
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
