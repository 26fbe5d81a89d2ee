// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

use super::*;
use chrono::TimeZone;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 11, 10, 0, 0).unwrap()
}

#[yare::parameterized(
    no_data = { DenyCause::NoLongWindow, false },
    too_early = { DenyCause::TooEarlyInPeriod, false },
    long_below_ramp = { DenyCause::LongBelowRamp, true },
    short_below_floor = { DenyCause::ShortBelowFloor, true },
)]
fn warmup_applies_only_when_both_windows_are_blocked(cause: DenyCause, expected: bool) {
    assert_eq!(warmup_model(EngineKind::GeminiPro, cause).is_some(), expected);
    assert_eq!(warmup_model(EngineKind::GeminiFlash, cause).is_some(), expected);
}

#[test]
fn warmup_picks_the_variant_model() {
    assert_eq!(
        warmup_model(EngineKind::GeminiPro, DenyCause::LongBelowRamp),
        Some(gemini::MODEL_PRO)
    );
    assert_eq!(
        warmup_model(EngineKind::GeminiFlash, DenyCause::ShortBelowFloor),
        Some(gemini::MODEL_FLASH)
    );
}

#[test]
fn non_gemini_engines_never_warm_up() {
    for kind in [
        EngineKind::Codex,
        EngineKind::Copilot,
        EngineKind::AmazonQ,
        EngineKind::Claude,
    ] {
        assert_eq!(warmup_model(kind, DenyCause::LongBelowRamp), None);
        assert_eq!(warmup_model(kind, DenyCause::ShortBelowFloor), None);
    }
}

#[test]
fn warmup_grant_is_one_shot_until_cooldown_elapses() {
    let store = StateStore::open_in_memory().unwrap();
    let cooldown = Duration::minutes(60);

    assert!(warmup_grant(&store, gemini::MODEL_PRO, cooldown, now()).unwrap());
    // Within the cool-down the grant is spent.
    assert!(!warmup_grant(&store, gemini::MODEL_PRO, cooldown, now()).unwrap());
    assert!(
        !warmup_grant(&store, gemini::MODEL_PRO, cooldown, now() + Duration::minutes(30))
            .unwrap()
    );
    // Once it elapses, one more attempt is granted and re-stamped.
    assert!(
        warmup_grant(&store, gemini::MODEL_PRO, cooldown, now() + Duration::minutes(60))
            .unwrap()
    );
    assert!(
        !warmup_grant(&store, gemini::MODEL_PRO, cooldown, now() + Duration::minutes(90))
            .unwrap()
    );
}

#[test]
fn warmup_grants_are_tracked_per_model() {
    let store = StateStore::open_in_memory().unwrap();
    let cooldown = Duration::minutes(60);
    assert!(warmup_grant(&store, gemini::MODEL_PRO, cooldown, now()).unwrap());
    assert!(warmup_grant(&store, gemini::MODEL_FLASH, cooldown, now()).unwrap());
    assert!(!warmup_grant(&store, gemini::MODEL_PRO, cooldown, now()).unwrap());
}

#[test]
fn day_start_buckets_by_utc_day() {
    assert_eq!(day_start(now()), Utc.with_ymd_and_hms(2026, 2, 11, 0, 0, 0).unwrap());
    assert_eq!(
        day_start(Utc.with_ymd_and_hms(2026, 2, 11, 23, 59, 59).unwrap()),
        day_start(now())
    );
}
