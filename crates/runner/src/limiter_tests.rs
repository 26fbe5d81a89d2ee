// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

use super::*;

fn limits() -> ServiceLimits {
    ServiceLimits { codex: 1, copilot: 1, gemini: 2, amazon_q: 1, claude: 1 }
}

#[test]
fn global_budget_bounds_all_services() {
    let gate = ConcurrencyGate::new(2, &limits());
    let a = gate.try_acquire(ServiceKind::Codex);
    let b = gate.try_acquire(ServiceKind::Gemini);
    assert!(a.is_some() && b.is_some());
    // Global budget exhausted even though gemini has a second slot.
    assert!(gate.try_acquire(ServiceKind::Gemini).is_none());
}

#[test]
fn service_cap_prevents_monopoly() {
    let gate = ConcurrencyGate::new(4, &limits());
    let first = gate.try_acquire(ServiceKind::Codex);
    assert!(first.is_some());
    // Codex cap is 1: a second codex run is refused while capacity
    // remains for another engine.
    assert!(gate.try_acquire(ServiceKind::Codex).is_none());
    assert!(gate.try_acquire(ServiceKind::Claude).is_some());
}

#[test]
fn dropping_a_permit_frees_both_tokens() {
    let gate = ConcurrencyGate::new(1, &limits());
    let permit = gate.try_acquire(ServiceKind::Codex).unwrap();
    assert_eq!(gate.available_global(), 0);
    drop(permit);
    assert_eq!(gate.available_global(), 1);
    assert!(gate.try_acquire(ServiceKind::Codex).is_some());
}

#[test]
fn failed_service_acquire_returns_the_global_token() {
    let gate = ConcurrencyGate::new(3, &limits());
    let _codex = gate.try_acquire(ServiceKind::Codex).unwrap();
    // Service-limited: the global token taken during the attempt must
    // come back.
    assert!(gate.try_acquire(ServiceKind::Codex).is_none());
    assert_eq!(gate.available_global(), 2);
}
