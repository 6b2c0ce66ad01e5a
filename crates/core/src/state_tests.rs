// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    completed = { WorkstreamState::Completed, true },
    error = { WorkstreamState::Error("boom".to_string()), true },
    starting = { WorkstreamState::Starting, false },
    running = { WorkstreamState::Running, false },
    waiting = { WorkstreamState::Waiting, false },
    paused = { WorkstreamState::Paused, false },
    reviewing = { WorkstreamState::Reviewing, false },
)]
fn terminal_classification(state: WorkstreamState, expected: bool) {
    assert_eq!(state.is_terminal(), expected);
}

#[test]
fn display_is_lowercase_without_payload() {
    assert_eq!(WorkstreamState::Running.to_string(), "running");
    assert_eq!(WorkstreamState::Error("x".to_string()).to_string(), "error");
}
