// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Immutable issue snapshot
//!
//! A snapshot of a GitHub issue or pull request at the moment it was
//! fetched. GitHub is the source of truth; the scheduler never mutates a
//! snapshot, it re-fetches.

use crate::repo::RepoRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Globally unique issue identifier (GitHub's numeric node id).
///
/// Distinct from the per-repo issue `number`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct IssueId(pub u64);

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: IssueId,
    pub number: u64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub repo: RepoRef,
    /// Label names in the order GitHub returned them.
    #[serde(default)]
    pub labels: Vec<String>,
    pub url: String,
    #[serde(default)]
    pub is_pull_request: bool,
}

impl Issue {
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l == name)
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.repo, self.number)
    }
}
