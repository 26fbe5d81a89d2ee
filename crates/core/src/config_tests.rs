// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

use super::*;

#[test]
fn defaults_are_sane() {
    let cfg = RunnerConfig::default();
    assert_eq!(cfg.scheduler.interval_secs, 60);
    assert_eq!(cfg.github.repos, RepoTarget::Local);
    assert!(cfg.idle.enabled);
    assert!(!cfg.idle.tasks.is_empty());
    assert_eq!(cfg.state_dir(), PathBuf::from("agent-runner/state"));
}

#[test]
fn parses_full_toml() {
    let text = r#"
        workdir_root = "/srv/agents"

        [github]
        owner = "metyatech"
        repos = ["metyatech/demo", "metyatech/site"]

        [scheduler]
        interval_secs = 30
        concurrency = 3
        issue_engines = ["codex", "claude"]

        [scheduler.service_limits]
        codex = 2

        [idle]
        cooldown_minutes = 60
        engines = ["gemini-pro", "gemini-flash"]
        tasks = ["tidy the docs"]

        [gates.codex]
        start_minutes = 60
        start_pct = 20
        end_pct = 0
        short_floor_pct = 5

        [webhook]
        enabled = true
        secret = "shh"
    "#;
    let cfg: RunnerConfig = toml::from_str(text).unwrap();
    assert_eq!(cfg.workdir_root, PathBuf::from("/srv/agents"));
    assert_eq!(
        cfg.github.repos,
        RepoTarget::List(vec!["metyatech/demo".into(), "metyatech/site".into()])
    );
    assert_eq!(cfg.scheduler.concurrency, 3);
    assert_eq!(
        cfg.scheduler.issue_engines,
        vec![EngineKind::Codex, EngineKind::Claude]
    );
    assert_eq!(cfg.scheduler.service_limits.codex, 2);
    assert_eq!(cfg.scheduler.service_limits.gemini, 1);
    assert!((cfg.gates.codex.start_minutes - 60.0).abs() < f64::EPSILON);
    assert!(cfg.webhook.enabled);
    assert_eq!(cfg.gates.for_engine(EngineKind::GeminiFlash), &cfg.gates.gemini);
}

#[yare::parameterized(
    all = { "\"all\"", RepoTarget::All },
    local = { "\"local\"", RepoTarget::Local },
    list = { "[\"o/r\"]", RepoTarget::List(vec!["o/r".to_string()]) },
)]
fn repo_target_forms(value: &str, expected: RepoTarget) {
    let text = format!("[github]\nowner = \"o\"\nrepos = {value}\n");
    let cfg: RunnerConfig = toml::from_str(&text).unwrap();
    assert_eq!(cfg.github.repos, expected);
}

#[test]
fn bad_repo_target_keyword_is_rejected() {
    let text = "[github]\nowner = \"o\"\nrepos = \"everything\"\n";
    assert!(toml::from_str::<RunnerConfig>(text).is_err());
}

#[test]
fn load_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agent-runner.toml");
    std::fs::write(&path, "[github]\nowner = \"metyatech\"\n").unwrap();
    let cfg = RunnerConfig::load(&path).unwrap();
    assert_eq!(cfg.github.owner, "metyatech");
}

#[test]
fn load_missing_file_is_io_error() {
    let err = RunnerConfig::load(Path::new("/nonexistent/agent-runner.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}
