// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

use super::*;
use chrono::TimeZone;
use std::time::Duration as StdDuration;

fn ctx() -> UsageContext {
    UsageContext::new(
        Utc.with_ymd_and_hms(2026, 2, 11, 10, 0, 0).unwrap(),
        StdDuration::from_secs(5),
    )
}

fn payload() -> LoadPayloadWire {
    serde_json::from_str(
        r#"{
            "usageSnapshot": {
                "models": [
                    { "model": "gemini-2.5-pro", "remainingFraction": 0.42,
                      "resetTime": "2026-02-12T00:00:00Z" },
                    { "model": "gemini-2.5-flash", "remainingFraction": 0.0 }
                ]
            }
        }"#,
    )
    .unwrap()
}

#[test]
fn per_model_windows_are_independent() {
    let ctx = ctx();
    let pro = windows_for_model(&ctx, &payload(), MODEL_PRO);
    let long = pro.long.unwrap();
    assert!((long.percent_left - 42.0).abs() < 1e-9);
    assert_eq!(long.resets_at, Utc.with_ymd_and_hms(2026, 2, 12, 0, 0, 0).unwrap());

    let flash = windows_for_model(&ctx, &payload(), MODEL_FLASH);
    assert!((flash.long.unwrap().percent_left - 0.0).abs() < f64::EPSILON);
}

#[test]
fn unknown_model_yields_empty_status() {
    let status = windows_for_model(&ctx(), &payload(), "gemini-9000");
    assert!(status.long.is_none() && status.short.is_none());
}

#[test]
fn variants_carry_their_model_flag() {
    let pro = GeminiEngine::pro().build_invocation(&TaskSpec::fresh("task"));
    assert_eq!(pro.args[1], MODEL_PRO);
    let flash = GeminiEngine::flash().build_invocation(&TaskSpec::fresh("task"));
    assert_eq!(flash.args[1], MODEL_FLASH);
    assert_eq!(GeminiEngine::pro().kind(), EngineKind::GeminiPro);
}
