// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

use super::*;

#[yare::parameterized(
    confirmed = { true, false, true },
    preview = { false, true, true },
    both = { true, true, true },
    neither = { false, false, false },
)]
fn confirmation_matrix(yes: bool, dry_run: bool, allowed: bool) {
    let result = require_confirmation(yes, dry_run);
    assert_eq!(result.is_ok(), allowed);
    if let Err(e) = result {
        assert_eq!(e.code, 2);
    }
}
