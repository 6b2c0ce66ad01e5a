// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The workstream lifecycle state machine.

use serde::{Deserialize, Serialize};

/// A workstream's lifecycle state.
///
/// Initial state on creation is `Starting`. `Completed` and `Error` are
/// terminal: observable, but the coordinator keeps the record until the
/// operator explicitly stops it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkstreamState {
    Starting,
    Running,
    Waiting,
    Reviewing,
    Paused,
    Completed,
    Error(String),
}

crate::simple_display! {
    WorkstreamState {
        Starting => "starting",
        Running => "running",
        Waiting => "waiting",
        Reviewing => "reviewing",
        Paused => "paused",
        Completed => "completed",
        Error(..) => "error",
    }
}

impl WorkstreamState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkstreamState::Completed | WorkstreamState::Error(_))
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
