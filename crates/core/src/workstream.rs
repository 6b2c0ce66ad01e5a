// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The central [`Workstream`] entity.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::message::{append_agent_chunk, ConversationMessage};
use crate::notification::Notification;
use crate::permission::PendingPermission;
use crate::state::WorkstreamState;
use crate::tool_call::{ToolCall, ToolStatus};

crate::define_id! {
    /// Unique identifier for a workstream. Stable for its lifetime, never
    /// reused once the record is removed (invariant W1).
    pub struct WorkstreamId("wst-");
}

/// An independent agent task with its own session, branch, and working copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workstream {
    pub id: WorkstreamId,
    pub name: String,
    pub task: String,
    pub state: WorkstreamState,
    /// Absent if no working copy was provisioned (invariant W3: set iff
    /// `branch_name` is set).
    pub worktree_path: Option<PathBuf>,
    pub branch_name: Option<String>,
    /// Absent until `connectWorkstream` succeeds (invariant W2).
    pub session_id: Option<String>,
    pub created_at_ms: u64,
    pub last_activity_ms: u64,
    pub activity: String,
    pub notifications: Vec<Notification>,
    pub message_history: Vec<ConversationMessage>,
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub active_tools: HashMap<String, ToolCall>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub pending_permission: Option<PendingPermission>,
}

impl Workstream {
    pub fn new(id: WorkstreamId, name: &str, task: &str, clock: &impl Clock) -> Self {
        let now = clock.epoch_ms();
        Self {
            id,
            name: sanitize_name(name),
            task: task.to_string(),
            state: WorkstreamState::Starting,
            worktree_path: None,
            branch_name: None,
            session_id: None,
            created_at_ms: now,
            last_activity_ms: now,
            activity: "Starting...".to_string(),
            notifications: Vec::new(),
            message_history: Vec::new(),
            active_tools: HashMap::new(),
            pending_permission: None,
        }
    }

    pub fn has_worktree(&self) -> bool {
        self.worktree_path.is_some()
    }

    /// Invariant M1. Returns true if a new message was created (the
    /// coordinator should only fire an observer `message` event then).
    pub fn append_agent_chunk(&mut self, text: &str, now_ms: u64) -> bool {
        self.last_activity_ms = now_ms;
        append_agent_chunk(&mut self.message_history, text, now_ms)
    }

    pub fn append_operator_message(&mut self, text: &str, now_ms: u64) {
        self.last_activity_ms = now_ms;
        self.message_history.push(ConversationMessage::new(crate::message::Role::Operator, text, now_ms));
    }

    pub fn upsert_tool_call(&mut self, tool: ToolCall, now_ms: u64) {
        self.last_activity_ms = now_ms;
        self.active_tools.insert(tool.id.clone(), tool);
    }

    /// Invariant T1: a terminal status removes the id from the map.
    pub fn update_tool_status(&mut self, id: &str, status: ToolStatus, now_ms: u64) -> Option<ToolCall> {
        self.last_activity_ms = now_ms;
        if status.is_terminal() {
            if let Some(mut tool) = self.active_tools.remove(id) {
                tool.status = status;
                return Some(tool);
            }
            return None;
        }
        if let Some(tool) = self.active_tools.get_mut(id) {
            tool.status = status;
            return Some(tool.clone());
        }
        None
    }

    pub fn push_notification(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }
}

/// Name sanitizer:
/// `"Hello, World! 123"` -> `"hello--world--123"`, lower-cased, only
/// `[a-z0-9-]` retained, truncated to at most 50 characters.
pub fn sanitize_name(raw: &str) -> String {
    let lowered: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect();
    crate::id::short(&lowered, 50).to_string()
}

#[cfg(test)]
#[path = "workstream_tests.rs"]
mod tests;
