// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Issue reads and label/comment mutations.

use crate::client::GithubClient;
use crate::error::GithubError;
use crate::wire::{CommentWire, IssueWire, RepoWire, SearchResultsWire};
use ar_core::{Issue, LabelPlan, RepoRef};
use chrono::{DateTime, Utc};
use serde_json::json;

/// An issue comment slice: id, author, association, body, created time.
#[derive(Debug, Clone)]
pub struct IssueComment {
    pub id: u64,
    pub author: Option<String>,
    pub author_is_bot: bool,
    pub author_association: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<CommentWire> for IssueComment {
    fn from(wire: CommentWire) -> Self {
        let author_is_bot = wire.user.as_ref().map(|u| u.is_bot()).unwrap_or(false);
        Self {
            id: wire.id,
            author: wire.user.map(|u| u.login),
            author_is_bot,
            author_association: wire.author_association,
            body: wire.body.unwrap_or_default(),
            created_at: wire.created_at,
        }
    }
}

impl GithubClient {
    /// List the owner's repositories, skipping archived ones and forks.
    pub async fn list_owner_repos(&self, owner: &str) -> Result<Vec<RepoRef>, GithubError> {
        let repos: Vec<RepoWire> = self
            .bounded(
                "list owner repos",
                self.octo().get(
                    format!("/users/{owner}/repos"),
                    Some(&[("per_page", "100"), ("sort", "pushed")]),
                ),
            )
            .await?;
        Ok(repos
            .into_iter()
            .filter(|r| !r.archived && !r.fork)
            .map(|r| RepoRef::new(r.owner.login, r.name))
            .collect())
    }

    /// Open issues and PRs for one repo, newest first.
    pub async fn list_open_issues(&self, repo: &RepoRef) -> Result<Vec<Issue>, GithubError> {
        let wires: Vec<IssueWire> = self
            .bounded(
                "list open issues",
                self.octo().get(
                    format!("/repos/{}/{}/issues", repo.owner, repo.name),
                    Some(&[("state", "open"), ("per_page", "100"), ("sort", "updated")]),
                ),
            )
            .await?;
        Ok(wires.into_iter().map(|w| w.into_issue(repo)).collect())
    }

    /// One issue snapshot.
    pub async fn get_issue(&self, repo: &RepoRef, number: u64) -> Result<Issue, GithubError> {
        let wire: IssueWire = self
            .bounded(
                "get issue",
                self.octo()
                    .get(format!("/repos/{}/{}/issues/{number}", repo.owner, repo.name), None::<&()>),
            )
            .await?;
        Ok(wire.into_issue(repo))
    }

    /// All comments on an issue, oldest first.
    pub async fn list_comments(
        &self,
        repo: &RepoRef,
        number: u64,
    ) -> Result<Vec<IssueComment>, GithubError> {
        let wires: Vec<CommentWire> = self
            .bounded(
                "list comments",
                self.octo().get(
                    format!("/repos/{}/{}/issues/{number}/comments", repo.owner, repo.name),
                    Some(&[("per_page", "100")]),
                ),
            )
            .await?;
        Ok(wires.into_iter().map(IssueComment::from).collect())
    }

    /// Search one repo for issues whose comments contain `/agent run`,
    /// updated after `since`. Used for webhook catch-up.
    pub async fn search_command_issues(
        &self,
        repo: &RepoRef,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Issue>, GithubError> {
        let mut query = format!("repo:{}/{} \"/agent run\" in:comments", repo.owner, repo.name);
        if let Some(since) = since {
            query.push_str(&format!(" updated:>{}", since.format("%Y-%m-%dT%H:%M:%S%:z")));
        }
        let results: SearchResultsWire = self
            .bounded(
                "search command issues",
                self.octo().get(
                    "/search/issues",
                    Some(&[("q", query.as_str()), ("per_page", "50")]),
                ),
            )
            .await?;
        Ok(results.items.into_iter().map(|w| w.into_issue(repo)).collect())
    }

    /// Add labels to an issue. No-op on an empty list.
    pub async fn add_labels(
        &self,
        repo: &RepoRef,
        number: u64,
        labels: &[String],
    ) -> Result<(), GithubError> {
        if labels.is_empty() {
            return Ok(());
        }
        let _: serde_json::Value = self
            .bounded(
                "add labels",
                self.octo().post(
                    format!("/repos/{}/{}/issues/{number}/labels", repo.owner, repo.name),
                    Some(&json!({ "labels": labels })),
                ),
            )
            .await?;
        Ok(())
    }

    /// Remove one label. Removing a label the issue does not carry is
    /// silently ignored (GitHub answers 404).
    pub async fn remove_label(
        &self,
        repo: &RepoRef,
        number: u64,
        label: &str,
    ) -> Result<(), GithubError> {
        let result: Result<serde_json::Value, GithubError> = self
            .bounded(
                "remove label",
                self.octo().delete(
                    format!(
                        "/repos/{}/{}/issues/{number}/labels/{label}",
                        repo.owner, repo.name
                    ),
                    None::<&()>,
                ),
            )
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(GithubError::Api(octocrab::Error::GitHub { ref source, .. }))
                if source.status_code.as_u16() == 404 =>
            {
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Apply a label plan: additions first, then removals, so an observer
    /// of the intermediate state sees the new status.
    pub async fn apply_label_plan(
        &self,
        repo: &RepoRef,
        number: u64,
        plan: &LabelPlan,
    ) -> Result<(), GithubError> {
        self.add_labels(repo, number, &plan.add).await?;
        for label in &plan.remove {
            self.remove_label(repo, number, label).await?;
        }
        Ok(())
    }

    /// Create an issue comment via the bot identity when configured.
    pub async fn create_comment(
        &self,
        repo: &RepoRef,
        number: u64,
        body: &str,
    ) -> Result<(), GithubError> {
        let _: serde_json::Value = self
            .bounded(
                "create comment",
                self.commenter().post(
                    format!("/repos/{}/{}/issues/{number}/comments", repo.owner, repo.name),
                    Some(&json!({ "body": body })),
                ),
            )
            .await?;
        Ok(())
    }

    /// Create or update one of the agent labels (for `labels sync`).
    pub async fn ensure_label(
        &self,
        repo: &RepoRef,
        name: &str,
        color: &str,
        description: &str,
    ) -> Result<(), GithubError> {
        let created: Result<serde_json::Value, GithubError> = self
            .bounded(
                "create label",
                self.octo().post(
                    format!("/repos/{}/{}/labels", repo.owner, repo.name),
                    Some(&json!({ "name": name, "color": color, "description": description })),
                ),
            )
            .await;
        match created {
            Ok(_) => Ok(()),
            Err(GithubError::Api(octocrab::Error::GitHub { ref source, .. }))
                if source.status_code.as_u16() == 422 =>
            {
                // Exists; update color/description in place.
                let _: serde_json::Value = self
                    .bounded(
                        "update label",
                        self.octo().patch(
                            format!("/repos/{}/{}/labels/{name}", repo.owner, repo.name),
                            Some(&json!({ "color": color, "description": description })),
                        ),
                    )
                    .await?;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
