// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Pull request reads and the merge mutation.

use crate::client::GithubClient;
use crate::error::GithubError;
use crate::wire::PullWire;
use ar_core::RepoRef;
use serde_json::json;

/// Slice of an open PR used by the idle duplicate-work guard.
#[derive(Debug, Clone)]
pub struct OpenPr {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub head_branch: String,
}

impl GithubClient {
    /// Open PRs for a repo, newest first.
    pub async fn list_open_prs(&self, repo: &RepoRef) -> Result<Vec<OpenPr>, GithubError> {
        let wires: Vec<PullWire> = self
            .bounded(
                "list open prs",
                self.octo().get(
                    format!("/repos/{}/{}/pulls", repo.owner, repo.name),
                    Some(&[("state", "open"), ("per_page", "100")]),
                ),
            )
            .await?;
        Ok(wires
            .into_iter()
            .map(|w| OpenPr {
                number: w.number,
                title: w.title,
                url: w.html_url,
                head_branch: w.head.branch,
            })
            .collect())
    }

    pub async fn get_pull(
        &self,
        repo: &RepoRef,
        number: u64,
    ) -> Result<PullWire, GithubError> {
        self.bounded(
            "get pull",
            self.octo()
                .get(format!("/repos/{}/{}/pulls/{number}", repo.owner, repo.name), None::<&()>),
        )
        .await
    }

    /// Squash-merge a managed PR (approval follow-ups).
    pub async fn merge_pull(&self, repo: &RepoRef, number: u64) -> Result<(), GithubError> {
        let _: serde_json::Value = self
            .bounded(
                "merge pull",
                self.octo().put(
                    format!("/repos/{}/{}/pulls/{number}/merge", repo.owner, repo.name),
                    Some(&json!({ "merge_method": "squash" })),
                ),
            )
            .await?;
        Ok(())
    }
}
