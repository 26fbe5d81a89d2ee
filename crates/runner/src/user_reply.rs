// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Needs-user-reply resumption: when a user answers, re-queue the issue
//! and carry the prior engine session into the resume.

use ar_github::IssueComment;

use crate::lifecycle::NEEDS_REPLY_COMMENT_MARKER;

/// The user reply that unblocks a needs-user-reply issue, if any.
///
/// Finds the last marker comment we posted, then the first non-bot
/// comment after it. No marker means the needs-user state predates this
/// store (or the comment was deleted); any non-bot comment then counts.
pub fn find_user_reply(comments: &[IssueComment]) -> Option<&IssueComment> {
    let marker_index = comments
        .iter()
        .rposition(|c| c.author_is_bot && c.body.contains(NEEDS_REPLY_COMMENT_MARKER));
    let search_from = marker_index.map(|i| i + 1).unwrap_or(0);
    comments[search_from..].iter().find(|c| !c.author_is_bot)
}

#[cfg(test)]
#[path = "user_reply_tests.rs"]
mod tests;
