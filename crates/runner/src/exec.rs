// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Execution runtime: spawn the engine child, pump its output into a
//! timestamped log, and classify the outcome.

use ar_core::{extract_summary, EngineKind, FailureStage, RunStatus, NEEDS_REPLY_MARKER};
use ar_engines::{extract_session_id, Invocation};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("spawned child has no pid (already reaped)")]
    NoPid,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Phrases any engine may print when it runs out of quota.
const QUOTA_MARKERS: &[&str] = &[
    "rate limit reached",
    "usage limit reached",
    "quota exceeded",
    "out of quota",
    "resource_exhausted",
    "too many requests",
];

#[derive(Debug, Clone)]
pub struct ExecRequest {
    pub engine: EngineKind,
    pub invocation: Invocation,
    pub cwd: PathBuf,
    pub log_path: PathBuf,
    pub timeout: Duration,
}

/// A spawned engine child with its log pumps attached.
pub struct SpawnedRun {
    child: tokio::process::Child,
    pub pid: u32,
    pumps: Vec<tokio::task::JoinHandle<()>>,
}

#[derive(Debug)]
pub struct ExecOutcome {
    pub status: RunStatus,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub session_id: Option<String>,
    pub summary: Option<String>,
    /// Full captured log text, for comment tails.
    pub log: String,
}

/// Log file name: `<repo>-issue-N-<epoch>.log` or `<repo>-idle-<epoch>.log`.
pub fn log_file_name(repo_name: &str, issue_number: Option<u64>, at: DateTime<Utc>) -> String {
    match issue_number {
        Some(n) => format!("{repo_name}-issue-{n}-{}.log", at.timestamp()),
        None => format!("{repo_name}-idle-{}.log", at.timestamp()),
    }
}

/// Last `n` lines of a log, for human-readable failure comments.
pub fn tail(log: &str, n: usize) -> String {
    let lines: Vec<&str> = log.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

async fn pump(
    stream: impl AsyncRead + Unpin,
    tag: &'static str,
    sink: Arc<Mutex<tokio::fs::File>>,
) {
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let stamped = format!("[{} {tag}] {line}\n", Utc::now().format("%Y-%m-%dT%H:%M:%SZ"));
        let mut file = sink.lock().await;
        let _ = file.write_all(stamped.as_bytes()).await;
    }
    let mut file = sink.lock().await;
    let _ = file.flush().await;
}

/// Spawn the engine child and start the log pumps. The caller records the
/// returned pid before awaiting completion.
pub async fn spawn_run(req: &ExecRequest) -> Result<SpawnedRun, ExecError> {
    if let Some(parent) = req.log_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let log_file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&req.log_path)
        .await?;
    let sink = Arc::new(Mutex::new(log_file));

    let mut cmd = tokio::process::Command::new(&req.invocation.program);
    cmd.args(&req.invocation.args)
        .current_dir(&req.cwd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(if req.invocation.stdin.is_some() { Stdio::piped() } else { Stdio::null() })
        .kill_on_drop(true);
    for (key, value) in &req.invocation.env {
        cmd.env(key, value);
    }

    let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
        program: req.invocation.program.clone(),
        source,
    })?;
    let pid = child.id().ok_or(ExecError::NoPid)?;

    if let Some(text) = &req.invocation.stdin {
        if let Some(mut stdin) = child.stdin.take() {
            let text = text.clone();
            tokio::spawn(async move {
                let _ = stdin.write_all(text.as_bytes()).await;
            });
        }
    }

    let mut pumps = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        pumps.push(tokio::spawn(pump(stdout, "out", sink.clone())));
    }
    if let Some(stderr) = child.stderr.take() {
        pumps.push(tokio::spawn(pump(stderr, "err", sink.clone())));
    }

    tracing::info!(
        engine = %req.engine,
        program = %req.invocation.program,
        pid,
        log = %req.log_path.display(),
        "engine child spawned"
    );

    Ok(SpawnedRun { child, pid, pumps })
}

/// Await the child (bounded), then read the log back and classify.
pub async fn wait_run(
    req: &ExecRequest,
    mut run: SpawnedRun,
    now: DateTime<Utc>,
) -> Result<ExecOutcome, ExecError> {
    let (exit_code, timed_out) = match tokio::time::timeout(req.timeout, run.child.wait()).await {
        Ok(Ok(status)) => (status.code(), false),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "wait on engine child failed");
            (None, false)
        }
        Err(_) => {
            tracing::warn!(
                engine = %req.engine,
                pid = run.pid,
                timeout_secs = req.timeout.as_secs(),
                "engine run timed out, killing"
            );
            let _ = run.child.start_kill();
            let _ = run.child.wait().await;
            (None, true)
        }
    };
    for pump in run.pumps {
        let _ = pump.await;
    }

    let log = tokio::fs::read_to_string(&req.log_path).await.unwrap_or_default();
    let session_id = extract_session_id(req.engine, &log);
    let summary = extract_summary(&log);
    let status = classify(exit_code, &log, session_id.is_some(), now);

    Ok(ExecOutcome { status, exit_code, timed_out, session_id, summary, log })
}

/// Classify a finished run from its exit code and log contents.
pub fn classify(
    exit_code: Option<i32>,
    log: &str,
    has_session: bool,
    now: DateTime<Utc>,
) -> RunStatus {
    if log.contains(NEEDS_REPLY_MARKER) {
        return RunStatus::NeedsUserReply;
    }
    if exit_code == Some(0) {
        return RunStatus::Success;
    }
    if quota_exhausted(log) {
        return RunStatus::Quota { resume_at: parse_resume_at(log, now) };
    }
    RunStatus::ExecutionError {
        stage: if has_session { FailureStage::AfterSession } else { FailureStage::BeforeSession },
    }
}

/// True when the log carries an out-of-quota marker.
pub fn quota_exhausted(log: &str) -> bool {
    let lowered = log.to_ascii_lowercase();
    QUOTA_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// Pull a resume instant out of a quota message, when one is present.
///
/// Understands `try again at <RFC3339>` and `resets in N
/// seconds|minutes|hours` forms.
pub fn parse_resume_at(log: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    static AT: std::sync::OnceLock<Option<Regex>> = std::sync::OnceLock::new();
    static IN: std::sync::OnceLock<Option<Regex>> = std::sync::OnceLock::new();
    let at = AT
        .get_or_init(|| {
            Regex::new(
                r"(?i)(?:try again|resumes?|resets?)\s+(?:at|after)\s+(\d{4}-\d{2}-\d{2}T[0-9:]{8}(?:\.\d+)?(?:Z|[+-]\d{2}:\d{2}))",
            )
            .ok()
        })
        .as_ref()?;
    let within = IN
        .get_or_init(|| {
            Regex::new(r"(?i)resets?\s+in\s+(\d+)\s*(seconds?|minutes?|hours?|s|m|h)\b").ok()
        })
        .as_ref()?;

    if let Some(captures) = at.captures_iter(log).last() {
        if let Some(raw) = captures.get(1) {
            if let Ok(parsed) = DateTime::parse_from_rfc3339(raw.as_str()) {
                return Some(parsed.with_timezone(&Utc));
            }
        }
    }
    if let Some(captures) = within.captures_iter(log).last() {
        let amount: i64 = captures.get(1)?.as_str().parse().ok()?;
        let unit = captures.get(2)?.as_str().to_ascii_lowercase();
        let delta = match unit.as_str() {
            "h" | "hour" | "hours" => ChronoDuration::hours(amount),
            "m" | "minute" | "minutes" => ChronoDuration::minutes(amount),
            _ => ChronoDuration::seconds(amount),
        };
        return Some(now + delta);
    }
    None
}

/// Best-effort read of a log file, for status/recovery surfaces.
pub fn read_log(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_default()
}

#[cfg(test)]
#[path = "exec_tests.rs"]
mod tests;
