// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool-call lifecycle tracking (invariant T1).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Pending,
    Completed,
    Failed,
}

impl ToolStatus {
    /// T1: a tool id stays in `activeTools[w]` only while its status is
    /// `pending`; `completed`/`failed` are terminal and cause removal.
    pub fn is_terminal(self) -> bool {
        matches!(self, ToolStatus::Completed | ToolStatus::Failed)
    }
}

crate::simple_display! {
    ToolStatus {
        Pending => "pending",
        Completed => "completed",
        Failed => "failed",
    }
}

/// An agent-invoked external action reported via streaming updates.
///
/// `id` is chosen by the remote agent, not minted locally — it is only
/// guaranteed unique within a single session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub title: String,
    pub status: ToolStatus,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self { id: id.into(), title: title.into(), status: ToolStatus::Pending }
    }
}

#[cfg(test)]
#[path = "tool_call_tests.rs"]
mod tests;
