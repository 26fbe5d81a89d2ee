// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! `agent-runner webhook` - GitHub webhook endpoint
//!
//! Verifies the HMAC signature, classifies the delivery, and enqueues
//! work into the shared state store. Nothing executes inline; the
//! scheduler drains the queues on its next cycle.

use ar_core::{RunnerConfig, WebhookQueueEntry};
use ar_github::webhook::{classify_event, verify_signature, WebhookAction};
use ar_storage::StateStore;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use std::sync::Arc;

use crate::exit_error::ExitError;

struct WebhookState {
    store: StateStore,
    secret: String,
    max_body_bytes: usize,
    recognized_review_bots: Vec<String>,
}

fn header<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

async fn deliver(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    if body.len() > state.max_body_bytes {
        return (StatusCode::PAYLOAD_TOO_LARGE, "payload too large");
    }
    let Some(signature) = header(&headers, "x-hub-signature-256") else {
        return (StatusCode::UNAUTHORIZED, "missing signature");
    };
    if !verify_signature(&state.secret, &body, signature) {
        return (StatusCode::UNAUTHORIZED, "bad signature");
    }
    let Some(event) = header(&headers, "x-github-event") else {
        return (StatusCode::BAD_REQUEST, "missing event header");
    };

    let action = match classify_event(event, &body, &state.recognized_review_bots) {
        Ok(action) => action,
        Err(e) => {
            tracing::warn!(event, error = %e, "unparseable webhook payload");
            return (StatusCode::BAD_REQUEST, "unparseable payload");
        }
    };

    match action {
        WebhookAction::Pong => (StatusCode::OK, "pong"),
        WebhookAction::Command(cmd) => {
            // Dedup on the comment id before enqueueing the issue.
            match state.store.record_command_comment(cmd.comment_id) {
                Ok(true) => {}
                Ok(false) => return (StatusCode::OK, "duplicate command"),
                Err(e) => {
                    tracing::error!(error = %e, "store error on command dedup");
                    return (StatusCode::INTERNAL_SERVER_ERROR, "store error");
                }
            }
            let entry = WebhookQueueEntry {
                issue_id: cmd.issue_id,
                issue_number: cmd.issue_number,
                repo: cmd.repo,
                url: cmd.url,
                title: cmd.title,
                enqueued_at: chrono::Utc::now(),
            };
            match state.store.enqueue_webhook(&entry) {
                Ok(_) => {
                    tracing::info!(issue = %entry.issue_number, repo = %entry.repo, "command enqueued");
                    (StatusCode::OK, "enqueued")
                }
                Err(e) => {
                    tracing::error!(error = %e, "store error on enqueue");
                    (StatusCode::INTERNAL_SERVER_ERROR, "store error")
                }
            }
        }
        WebhookAction::Followup(entry) => {
            // Only PRs this runner manages get follow-up work.
            match state.store.is_managed_pr(&entry.repo, entry.pr_number) {
                Ok(true) => {}
                Ok(false) => return (StatusCode::OK, "not a managed PR"),
                Err(e) => {
                    tracing::error!(error = %e, "store error on managed-PR check");
                    return (StatusCode::INTERNAL_SERVER_ERROR, "store error");
                }
            }
            match state.store.upsert_followup(&entry) {
                Ok(()) => {
                    tracing::info!(pr = entry.pr_number, repo = %entry.repo, "follow-up enqueued");
                    (StatusCode::OK, "follow-up enqueued")
                }
                Err(e) => {
                    tracing::error!(error = %e, "store error on follow-up");
                    (StatusCode::INTERNAL_SERVER_ERROR, "store error")
                }
            }
        }
        WebhookAction::Ignored(reason) => {
            tracing::debug!(event, reason, "webhook delivery ignored");
            (StatusCode::OK, "ignored")
        }
    }
}

pub async fn serve(
    config: RunnerConfig,
    host: &str,
    port: u16,
    path: &str,
) -> anyhow::Result<()> {
    let secret = config.webhook.secret.clone().ok_or_else(|| {
        ExitError::new(2, "webhook.secret must be configured to serve the webhook endpoint")
    })?;
    let state = Arc::new(WebhookState {
        store: StateStore::open(&config.state_dir())?,
        secret,
        max_body_bytes: config.webhook.max_body_bytes,
        recognized_review_bots: config.github.recognized_review_bots.clone(),
    });

    let app = Router::new().route(path, post(deliver)).with_state(state);
    let addr = format!("{host}:{port}");
    tracing::info!(addr = %addr, path, "webhook endpoint listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
