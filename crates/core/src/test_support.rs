// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{FakeClock, Role, Workstream, WorkstreamId, WorkstreamState};

/// Proptest strategies for core state machine types.
pub mod strategies {
    use crate::{Role, WorkstreamState};
    use proptest::prelude::*;

    pub fn arb_workstream_state() -> impl Strategy<Value = WorkstreamState> {
        prop_oneof![
            Just(WorkstreamState::Starting),
            Just(WorkstreamState::Running),
            Just(WorkstreamState::Waiting),
            Just(WorkstreamState::Reviewing),
            Just(WorkstreamState::Paused),
            Just(WorkstreamState::Completed),
            any::<String>().prop_map(WorkstreamState::Error),
        ]
    }

    pub fn arb_role() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::Operator), Just(Role::Agent), Just(Role::System)]
    }

    /// Arbitrary text restricted to printable ASCII so sanitizer/coalescing
    /// property tests don't have to reason about multi-byte boundaries.
    pub fn arb_chunk_text() -> impl Strategy<Value = String> {
        "[ -~]{0,40}"
    }
}

/// Builds a workstream in `starting` state with a fake clock, suitable as a
/// baseline for coordinator and invariant tests.
pub fn bare_workstream(name: &str) -> Workstream {
    let clock = FakeClock::new();
    Workstream::new(WorkstreamId::new(), name, "test task", &clock)
}

pub fn message(role: Role, text: &str) -> crate::ConversationMessage {
    crate::ConversationMessage { role, content: text.to_string(), timestamp_ms: 0 }
}
