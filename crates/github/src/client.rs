// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Client bootstrap: token resolution, octocrab construction, and the
//! optional GitHub App identity used for bot-authored comments.

use crate::error::GithubError;
use octocrab::Octocrab;
use serde::Deserialize;
use std::time::Duration;

/// Resolve the GitHub token from the environment:
/// `AGENT_GITHUB_TOKEN`, then `GITHUB_TOKEN`, then `GH_TOKEN`.
pub fn resolve_token() -> Option<String> {
    for key in ["AGENT_GITHUB_TOKEN", "GITHUB_TOKEN", "GH_TOKEN"] {
        if let Ok(value) = std::env::var(key) {
            if !value.trim().is_empty() {
                return Some(value.trim().to_string());
            }
        }
    }
    None
}

/// GitHub App triple for bot-identity comments, from
/// `AGENT_GITHUB_NOTIFY_APP_{ID,INSTALLATION_ID,PRIVATE_KEY_PATH}`.
#[derive(Debug, Clone)]
pub struct NotifyApp {
    pub app_id: u64,
    pub installation_id: u64,
    pub private_key_path: std::path::PathBuf,
}

impl NotifyApp {
    pub fn from_env() -> Option<Self> {
        let app_id = std::env::var("AGENT_GITHUB_NOTIFY_APP_ID").ok()?.parse().ok()?;
        let installation_id =
            std::env::var("AGENT_GITHUB_NOTIFY_APP_INSTALLATION_ID").ok()?.parse().ok()?;
        let private_key_path =
            std::env::var("AGENT_GITHUB_NOTIFY_APP_PRIVATE_KEY_PATH").ok()?.into();
        Some(Self { app_id, installation_id, private_key_path })
    }
}

#[derive(serde::Serialize)]
struct AppJwtClaims {
    iat: i64,
    exp: i64,
    iss: String,
}

#[derive(Deserialize)]
struct InstallationTokenWire {
    token: String,
}

/// The GitHub adapter handle. One per process.
pub struct GithubClient {
    octo: Octocrab,
    /// Separate client authenticated as the notify App, when configured.
    /// Comments go through this identity so they read as the bot's.
    notify: Option<Octocrab>,
    timeout: Duration,
}

impl GithubClient {
    /// Build from the env token chain.
    pub async fn from_env(timeout: Duration) -> Result<Self, GithubError> {
        let token = resolve_token().ok_or(GithubError::MissingToken)?;
        let octo = Octocrab::builder()
            .personal_token(token)
            .build()
            .map_err(GithubError::from_octocrab)?;

        let notify = match NotifyApp::from_env() {
            Some(app) => Some(build_notify_client(&app).await?),
            None => None,
        };

        Ok(Self { octo, notify, timeout })
    }

    /// Test/bench constructor with an already-built octocrab.
    pub fn with_octocrab(octo: Octocrab, timeout: Duration) -> Self {
        Self { octo, notify: None, timeout }
    }

    pub(crate) fn octo(&self) -> &Octocrab {
        &self.octo
    }

    /// The client to author comments with: the App identity when
    /// configured, the token identity otherwise.
    pub(crate) fn commenter(&self) -> &Octocrab {
        self.notify.as_ref().unwrap_or(&self.octo)
    }

    /// Await `fut` under the configured API timeout, folding octocrab
    /// errors into the adapter taxonomy.
    pub(crate) async fn bounded<T>(
        &self,
        what: &'static str,
        fut: impl std::future::Future<Output = Result<T, octocrab::Error>>,
    ) -> Result<T, GithubError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(GithubError::from_octocrab(e)),
            Err(_) => Err(GithubError::Timeout { what, seconds: self.timeout.as_secs() }),
        }
    }
}

/// Mint an installation token for the notify App and wrap it in its own
/// octocrab instance.
async fn build_notify_client(app: &NotifyApp) -> Result<Octocrab, GithubError> {
    let pem = std::fs::read(&app.private_key_path).map_err(|e| {
        GithubError::AppAuth(format!(
            "cannot read private key {}: {e}",
            app.private_key_path.display()
        ))
    })?;
    let key = jsonwebtoken::EncodingKey::from_rsa_pem(&pem)
        .map_err(|e| GithubError::AppAuth(format!("invalid RSA key: {e}")))?;

    let now = chrono::Utc::now().timestamp();
    let claims = AppJwtClaims {
        // Backdated to absorb clock skew, ten-minute validity per GitHub.
        iat: now - 60,
        exp: now + 9 * 60,
        iss: app.app_id.to_string(),
    };
    let jwt = jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256),
        &claims,
        &key,
    )
    .map_err(|e| GithubError::AppAuth(format!("cannot sign app JWT: {e}")))?;

    let app_client = Octocrab::builder()
        .personal_token(jwt)
        .build()
        .map_err(GithubError::from_octocrab)?;
    let minted: InstallationTokenWire = app_client
        .post(
            format!("/app/installations/{}/access_tokens", app.installation_id),
            None::<&()>,
        )
        .await
        .map_err(GithubError::from_octocrab)?;

    Octocrab::builder()
        .personal_token(minted.token)
        .build()
        .map_err(GithubError::from_octocrab)
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
