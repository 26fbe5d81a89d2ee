// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

use super::*;
use chrono::TimeZone;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 11, 10, 0, 0).unwrap()
}

fn cfg(tasks: &[&str], max_runs: usize, cooldown_minutes: i64) -> IdleConfig {
    IdleConfig {
        enabled: true,
        cooldown_minutes,
        max_runs_per_cycle: max_runs,
        engines: vec![EngineKind::GeminiPro, EngineKind::GeminiFlash],
        tasks: tasks.iter().map(|t| t.to_string()).collect(),
    }
}

fn history(name: &str, idled_minutes_ago: Option<i64>, cursor: u64) -> IdleHistory {
    IdleHistory {
        repo: RepoRef::new("metyatech", name),
        last_idle_at: idled_minutes_ago.map(|m| now() - Duration::minutes(m)),
        task_cursor: cursor,
    }
}

#[test]
fn cooldown_filters_recent_repos() {
    let histories =
        vec![history("fresh", Some(10), 0), history("cooled", Some(120), 0)];
    let plans = plan_idle(now(), &cfg(&["t"], 2, 60), &histories, &[EngineKind::GeminiPro], 4);
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].repo.name, "cooled");
}

#[test]
fn never_idled_repos_come_first_then_oldest() {
    let histories = vec![
        history("recent", Some(100), 0),
        history("ancient", Some(10_000), 0),
        history("virgin", None, 0),
    ];
    let engines = [EngineKind::GeminiPro, EngineKind::GeminiFlash];
    let plans = plan_idle(now(), &cfg(&["t"], 2, 60), &histories, &engines, 4);
    assert_eq!(plans.len(), 2);
    assert_eq!(plans[0].repo.name, "virgin");
    assert_eq!(plans[1].repo.name, "ancient");
}

#[test]
fn name_breaks_last_idle_ties() {
    let histories = vec![history("zeta", None, 0), history("alpha", None, 0)];
    let plans = plan_idle(now(), &cfg(&["t"], 2, 60), &histories, &[EngineKind::GeminiPro], 4);
    assert_eq!(plans[0].repo.name, "alpha");
}

#[test]
fn engines_assign_round_robin_deterministically() {
    let histories = vec![
        history("a", None, 0),
        history("b", None, 0),
    ];
    let engines = [EngineKind::GeminiPro, EngineKind::GeminiFlash];
    let plans = plan_idle(now(), &cfg(&["t"], 2, 60), &histories, &engines, 4);
    assert_eq!(plans[0].engine, EngineKind::GeminiPro);
    assert_eq!(plans[1].engine, EngineKind::GeminiFlash);
}

#[test]
fn every_allowed_engine_gets_a_slot_beyond_the_cap() {
    // max_runs_per_cycle = 1 but two engines are allowed: both get work.
    let histories = vec![history("a", None, 0), history("b", None, 0)];
    let engines = [EngineKind::GeminiPro, EngineKind::GeminiFlash];
    let plans = plan_idle(now(), &cfg(&["t"], 1, 60), &histories, &engines, 4);
    assert_eq!(plans.len(), 2);
}

#[test]
fn slack_bounds_the_plan() {
    let histories = vec![history("a", None, 0), history("b", None, 0)];
    let engines = [EngineKind::GeminiPro, EngineKind::GeminiFlash];
    let plans = plan_idle(now(), &cfg(&["t"], 2, 60), &histories, &engines, 1);
    assert_eq!(plans.len(), 1);
}

#[test]
fn task_cursor_selects_round_robin_and_advances() {
    let histories = vec![history("a", None, 4)];
    let plans = plan_idle(
        now(),
        &cfg(&["one", "two", "three"], 1, 60),
        &histories,
        &[EngineKind::GeminiPro],
        4,
    );
    assert_eq!(plans[0].task, "two"); // 4 % 3 == 1
    assert_eq!(plans[0].next_cursor, 5);
}

#[test]
fn disabled_or_empty_inputs_plan_nothing() {
    let histories = vec![history("a", None, 0)];
    let mut disabled = cfg(&["t"], 1, 60);
    disabled.enabled = false;
    assert!(plan_idle(now(), &disabled, &histories, &[EngineKind::GeminiPro], 4).is_empty());
    assert!(plan_idle(now(), &cfg(&[], 1, 60), &histories, &[EngineKind::GeminiPro], 4).is_empty());
    assert!(plan_idle(now(), &cfg(&["t"], 1, 60), &histories, &[], 4).is_empty());
    assert!(plan_idle(now(), &cfg(&["t"], 1, 60), &histories, &[EngineKind::GeminiPro], 0).is_empty());
}

#[test]
fn guard_embeds_count_and_truncated_titles() {
    let prs: Vec<(String, String)> = (0..12)
        .map(|i| (format!("PR {i}"), format!("https://github.com/o/r/pull/{i}")))
        .collect();
    let prompt = render_idle_prompt("tidy the docs", Some(12), &prs);
    assert!(prompt.starts_with("tidy the docs"));
    assert!(prompt.contains(GUARD_START));
    assert!(prompt.contains(GUARD_END));
    assert!(prompt.contains("Open pull requests: 12"));
    assert!(prompt.contains("PR 9"));
    assert!(!prompt.contains("PR 10 ("));
    assert!(prompt.contains("… and 2 more"));
    assert!(prompt.contains("untrusted"));
}

#[test]
fn guard_reports_unknown_count_on_query_failure() {
    let prompt = render_idle_prompt("task", None, &[]);
    assert!(prompt.contains("Open pull requests: unknown"));
}
