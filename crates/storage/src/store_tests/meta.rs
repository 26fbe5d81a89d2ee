// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

use super::{store, t0};
use ar_core::RepoRef;
use chrono::Duration;

#[test]
fn cached_repo_list_replaces_wholesale() {
    let store = store();
    store
        .replace_cached_repos(&[RepoRef::new("o", "a"), RepoRef::new("o", "b")])
        .unwrap();
    assert_eq!(store.cached_repos().unwrap().len(), 2);

    store.replace_cached_repos(&[RepoRef::new("o", "c")]).unwrap();
    let cached = store.cached_repos().unwrap();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].name, "c");
}

#[test]
fn rate_limited_until_set_and_clear() {
    let store = store();
    assert_eq!(store.rate_limited_until().unwrap(), None);
    store.set_rate_limited_until(Some(t0())).unwrap();
    assert_eq!(store.rate_limited_until().unwrap(), Some(t0()));
    store.set_rate_limited_until(None).unwrap();
    assert_eq!(store.rate_limited_until().unwrap(), None);
}

#[test]
fn webhook_catchup_cursor_roundtrips() {
    let store = store();
    assert_eq!(store.webhook_catchup_last_run().unwrap(), None);
    store.set_webhook_catchup_last_run(t0()).unwrap();
    assert_eq!(store.webhook_catchup_last_run().unwrap(), Some(t0()));
}

#[test]
fn amazon_q_counter_buckets_by_day() {
    let store = store();
    let day = t0();
    assert_eq!(store.amazon_q_usage(day).unwrap(), 0);
    assert_eq!(store.increment_amazon_q_usage(day).unwrap(), 1);
    assert_eq!(store.increment_amazon_q_usage(day).unwrap(), 2);
    assert_eq!(store.amazon_q_usage(day).unwrap(), 2);
    // Another day is an independent bucket.
    assert_eq!(store.amazon_q_usage(day + Duration::days(1)).unwrap(), 0);
}

#[test]
fn gemini_warmup_stamp_roundtrips() {
    let store = store();
    assert_eq!(store.gemini_warmup_last_attempt("gemini-pro").unwrap(), None);
    store.record_gemini_warmup("gemini-pro", t0()).unwrap();
    assert_eq!(store.gemini_warmup_last_attempt("gemini-pro").unwrap(), Some(t0()));
    assert_eq!(store.gemini_warmup_last_attempt("gemini-flash").unwrap(), None);
}
