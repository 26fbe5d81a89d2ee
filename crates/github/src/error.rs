// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! GitHub adapter error type

#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    #[error("no GitHub token found (tried AGENT_GITHUB_TOKEN, GITHUB_TOKEN, GH_TOKEN)")]
    MissingToken,

    #[error("GitHub rate limit exceeded")]
    RateLimited,

    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),

    #[error("GitHub API call timed out after {seconds}s: {what}")]
    Timeout { what: &'static str, seconds: u64 },

    #[error("GitHub App auth failed: {0}")]
    AppAuth(String),

    #[error("unexpected GraphQL response shape: {0}")]
    GraphqlShape(String),
}

impl GithubError {
    /// Fold octocrab errors into [`GithubError::RateLimited`] when GitHub
    /// is telling us to back off.
    pub fn from_octocrab(err: octocrab::Error) -> Self {
        if is_rate_limit(&err) {
            GithubError::RateLimited
        } else {
            GithubError::Api(err)
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, GithubError::RateLimited)
    }
}

fn is_rate_limit(err: &octocrab::Error) -> bool {
    if let octocrab::Error::GitHub { source, .. } = err {
        let status = source.status_code.as_u16();
        if status == 429 {
            return true;
        }
        if status == 403 {
            let message = source.message.to_ascii_lowercase();
            return message.contains("rate limit") || message.contains("secondary rate");
        }
    }
    false
}
