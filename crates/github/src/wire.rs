// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Wire types for the REST payload slices the scheduler consumes.
//!
//! We own these shapes rather than borrowing a full client model so the
//! adapter depends only on fields it actually reads.

use ar_core::{Issue, IssueId, RepoRef};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct UserWire {
    pub login: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl UserWire {
    pub fn is_bot(&self) -> bool {
        self.login.ends_with("[bot]") || self.kind.as_deref() == Some("Bot")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabelWire {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueWire {
    pub id: u64,
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub user: Option<UserWire>,
    #[serde(default)]
    pub labels: Vec<LabelWire>,
    pub html_url: String,
    /// Present (possibly as an object) when the issue is a pull request.
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

impl IssueWire {
    pub fn into_issue(self, repo: &RepoRef) -> Issue {
        Issue {
            id: IssueId(self.id),
            number: self.number,
            title: self.title,
            body: self.body,
            author: self.user.map(|u| u.login),
            repo: repo.clone(),
            labels: self.labels.into_iter().map(|l| l.name).collect(),
            url: self.html_url,
            is_pull_request: self.pull_request.is_some(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentWire {
    pub id: u64,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub user: Option<UserWire>,
    #[serde(default)]
    pub author_association: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepoWire {
    pub name: String,
    pub owner: UserWire,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub fork: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BranchRefWire {
    #[serde(rename = "ref")]
    pub branch: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullWire {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub html_url: String,
    pub head: BranchRefWire,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewWire {
    pub id: u64,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub user: Option<UserWire>,
    #[serde(default)]
    pub author_association: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResultsWire {
    #[serde(default)]
    pub items: Vec<IssueWire>,
}
