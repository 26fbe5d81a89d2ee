// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

use super::*;
use std::collections::HashSet;

#[test]
fn equality_ignores_case() {
    let a = RepoRef::new("MetyaTech", "Demo");
    let b = RepoRef::new("metyatech", "demo");
    assert_eq!(a, b);
}

#[test]
fn hash_agrees_with_equality() {
    let mut set = HashSet::new();
    set.insert(RepoRef::new("Owner", "Repo"));
    assert!(set.contains(&RepoRef::new("owner", "repo")));
}

#[test]
fn display_preserves_original_case() {
    let r = RepoRef::new("MetyaTech", "Demo");
    assert_eq!(r.to_string(), "MetyaTech/Demo");
    assert_eq!(r.key(), "metyatech/demo");
}

#[test]
fn slug_and_url() {
    let r = RepoRef::new("metyatech", "demo");
    assert_eq!(r.slug(), "metyatech--demo");
    assert_eq!(r.https_url(), "https://github.com/metyatech/demo.git");
}

#[yare::parameterized(
    plain = { "owner/repo", Some(("owner", "repo")) },
    missing_slash = { "ownerrepo", None },
    empty_owner = { "/repo", None },
    empty_name = { "owner/", None },
    nested = { "a/b/c", None },
)]
fn parse_cases(input: &str, expected: Option<(&str, &str)>) {
    let parsed: Result<RepoRef, _> = input.parse();
    match expected {
        Some((owner, name)) => {
            let r = parsed.unwrap();
            assert_eq!(r.owner, owner);
            assert_eq!(r.name, name);
        }
        None => assert!(parsed.is_err()),
    }
}
