// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Engine adapter error type

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no credentials for {engine}: {detail}")]
    NoCredentials { engine: &'static str, detail: String },

    #[error("quota backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unparseable quota payload for {engine}: {detail}")]
    Parse { engine: &'static str, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
