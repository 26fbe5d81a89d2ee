// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! PR review reads and the approval-phrase heuristic.

use crate::client::GithubClient;
use crate::error::GithubError;
use crate::wire::ReviewWire;
use ar_core::RepoRef;
use serde_json::json;

/// Literal lowercase substrings accepted as "OK / no new comments".
const APPROVAL_PHRASES: &[&str] = &[
    "lgtm",
    "looks good",
    "ok to merge",
    "no new comments",
    "no further comments",
    "approved",
];

/// True when a review body reads as an approval without changes.
pub fn is_approval_phrase(body: &str) -> bool {
    let lowered = body.to_ascii_lowercase();
    APPROVAL_PHRASES.iter().any(|phrase| lowered.contains(phrase))
}

/// Normalized review event used by the follow-up classifier.
#[derive(Debug, Clone)]
pub struct ReviewEvent {
    pub state: Option<String>,
    pub body: Option<String>,
    pub author: Option<String>,
    pub author_is_bot: bool,
    pub author_association: Option<String>,
}

impl From<ReviewWire> for ReviewEvent {
    fn from(wire: ReviewWire) -> Self {
        let author_is_bot = wire.user.as_ref().map(|u| u.is_bot()).unwrap_or(false);
        Self {
            state: wire.state,
            body: wire.body,
            author: wire.user.map(|u| u.login),
            author_is_bot,
            author_association: wire.author_association,
        }
    }
}

impl GithubClient {
    /// Reviews submitted on a PR, oldest first.
    pub async fn list_reviews(
        &self,
        repo: &RepoRef,
        number: u64,
    ) -> Result<Vec<ReviewEvent>, GithubError> {
        let wires: Vec<ReviewWire> = self
            .bounded(
                "list reviews",
                self.octo().get(
                    format!("/repos/{}/{}/pulls/{number}/reviews", repo.owner, repo.name),
                    Some(&[("per_page", "100")]),
                ),
            )
            .await?;
        Ok(wires.into_iter().map(ReviewEvent::from).collect())
    }

    /// Count unresolved review threads on a PR via GraphQL.
    pub async fn unresolved_review_threads(
        &self,
        repo: &RepoRef,
        number: u64,
    ) -> Result<u64, GithubError> {
        let query = r#"
            query($owner: String!, $name: String!, $number: Int!) {
              repository(owner: $owner, name: $name) {
                pullRequest(number: $number) {
                  reviewThreads(first: 100) {
                    nodes { isResolved }
                  }
                }
              }
            }
        "#;
        let body = json!({
            "query": query,
            "variables": {
                "owner": repo.owner,
                "name": repo.name,
                "number": number,
            },
        });
        let response: serde_json::Value =
            self.bounded("review threads", self.octo().graphql(&body)).await?;

        let nodes = response
            .pointer("/data/repository/pullRequest/reviewThreads/nodes")
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                GithubError::GraphqlShape("missing reviewThreads.nodes".to_string())
            })?;
        Ok(nodes
            .iter()
            .filter(|n| n.pointer("/isResolved").and_then(|v| v.as_bool()) == Some(false))
            .count() as u64)
    }
}

#[cfg(test)]
#[path = "reviews_tests.rs"]
mod tests;
