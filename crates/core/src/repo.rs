// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Repository reference value type

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A GitHub repository reference (`owner/name`).
///
/// Equality and hashing are case-insensitive, matching GitHub's own
/// treatment of owner and repository names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self { owner: owner.into(), name: name.into() }
    }

    /// Canonical lowercase `owner/name` form, used as a storage key.
    pub fn key(&self) -> String {
        format!("{}/{}", self.owner.to_ascii_lowercase(), self.name.to_ascii_lowercase())
    }

    /// Filesystem-safe `owner--name` form for per-run checkout directories.
    pub fn slug(&self) -> String {
        format!("{}--{}", self.owner, self.name)
    }

    /// HTTPS clone URL.
    pub fn https_url(&self) -> String {
        format!("https://github.com/{}/{}.git", self.owner, self.name)
    }
}

impl PartialEq for RepoRef {
    fn eq(&self, other: &Self) -> bool {
        self.owner.eq_ignore_ascii_case(&other.owner)
            && self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl Eq for RepoRef {}

impl Hash for RepoRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Lowercased so the hash agrees with case-insensitive equality.
        for b in self.owner.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
        state.write_u8(b'/');
        for b in self.name.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid repository reference {input:?}: expected owner/name")]
pub struct RepoRefParseError {
    pub input: String,
}

impl FromStr for RepoRef {
    type Err = RepoRefParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self::new(owner, name))
            }
            _ => Err(RepoRefParseError { input: s.to_string() }),
        }
    }
}

#[cfg(test)]
#[path = "repo_tests.rs"]
mod tests;
