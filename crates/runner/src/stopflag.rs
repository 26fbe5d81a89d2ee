// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Stop-request flag file.
//!
//! `agent-runner stop` touches the flag; the driver checks it between
//! cycles and stops scheduling new work (in-flight children drain).
//! `agent-runner resume` removes it.

use std::path::{Path, PathBuf};

const STOP_FILE: &str = "stop";

#[derive(Debug, Clone)]
pub struct StopFlag {
    path: PathBuf,
}

impl StopFlag {
    pub fn new(state_dir: &Path) -> Self {
        Self { path: state_dir.join(STOP_FILE) }
    }

    pub fn is_set(&self) -> bool {
        self.path.exists()
    }

    pub fn set(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, b"stop requested\n")
    }

    pub fn clear(&self) -> std::io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[path = "stopflag_tests.rs"]
mod tests;
