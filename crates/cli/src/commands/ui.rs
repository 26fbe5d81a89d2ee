// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! `agent-runner ui` - minimal HTML status page + JSON API

use ar_core::RunnerConfig;
use ar_runner::{StatusSnapshot, StopFlag};
use ar_storage::StateStore;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::Json;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

struct UiState {
    store: StateStore,
    stop: StopFlag,
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn render_page(snapshot: &StatusSnapshot) -> String {
    let mut rows = String::new();
    for entry in &snapshot.running {
        let what = match entry.activity.issue_number {
            Some(n) => format!("issue #{n}"),
            None => format!("idle: {}", entry.activity.task.as_deref().unwrap_or("?")),
        };
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape(&entry.activity.repo.to_string()),
            escape(&entry.activity.engine.to_string()),
            escape(&what),
            entry.activity.pid,
            if entry.pid_alive { "alive" } else { "dead" },
        ));
    }
    let mut retries = String::new();
    for retry in &snapshot.scheduled_retries {
        retries.push_str(&format!(
            "<li>{}#{} resumes at {}</li>\n",
            escape(&retry.repo.to_string()),
            retry.issue_number,
            retry.run_after.to_rfc3339(),
        ));
    }
    format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\">\
         <title>agent-runner</title></head><body>\n\
         <h1>agent-runner</h1>\n\
         <p>generated {}{}{}</p>\n\
         <h2>Running ({})</h2>\n\
         <table border=\"1\"><tr><th>repo</th><th>engine</th><th>work</th>\
         <th>pid</th><th>state</th></tr>\n{rows}</table>\n\
         <h2>Scheduled retries ({})</h2>\n<ul>{retries}</ul>\n\
         <p>webhook queue: {} · review follow-ups: {}</p>\n\
         </body></html>\n",
        snapshot.generated_at.to_rfc3339(),
        if snapshot.stop_requested { " · STOP REQUESTED" } else { "" },
        snapshot
            .rate_limited_until
            .map(|at| format!(" · rate limited until {}", at.to_rfc3339()))
            .unwrap_or_default(),
        snapshot.running.len(),
        snapshot.scheduled_retries.len(),
        snapshot.webhook_queue_len,
        snapshot.review_followups,
    )
}

async fn page(State(state): State<Arc<UiState>>) -> impl IntoResponse {
    match StatusSnapshot::gather(&state.store, &state.stop, chrono::Utc::now()) {
        Ok(snapshot) => Html(render_page(&snapshot)).into_response(),
        Err(e) => {
            (StatusCode::INTERNAL_SERVER_ERROR, format!("status error: {e}")).into_response()
        }
    }
}

async fn api_status(State(state): State<Arc<UiState>>) -> impl IntoResponse {
    match StatusSnapshot::gather(&state.store, &state.stop, chrono::Utc::now()) {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => {
            (StatusCode::INTERNAL_SERVER_ERROR, format!("status error: {e}")).into_response()
        }
    }
}

pub async fn serve(config: RunnerConfig, host: &str, port: u16) -> anyhow::Result<()> {
    let state = Arc::new(UiState {
        store: StateStore::open(&config.state_dir())?,
        stop: StopFlag::new(&config.state_dir()),
    });
    let app = Router::new()
        .route("/", get(page))
        .route("/api/status", get(api_status))
        .with_state(state);

    let addr = format!("{host}:{port}");
    tracing::info!(addr = %addr, "status UI listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
