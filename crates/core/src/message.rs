// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conversation messages and the coalescing rule (invariant M1).

use serde::{Deserialize, Serialize};

/// Who authored a [`ConversationMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Operator,
    Agent,
    System,
}

crate::simple_display! {
    Role {
        Operator => "operator",
        Agent => "agent",
        System => "system",
    }
}

/// One entry in a workstream's conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
    pub timestamp_ms: u64,
}

impl ConversationMessage {
    pub fn new(role: Role, content: impl Into<String>, timestamp_ms: u64) -> Self {
        Self { role, content: content.into(), timestamp_ms }
    }
}

/// Appends an agent text chunk to `history`, enforcing invariant M1: no two
/// adjacent `agent` messages ever exist. Returns `true` if a brand-new
/// message was pushed (the caller should only fire an observer `message`
/// event on the first chunk of a run, not on every chunk).
pub fn append_agent_chunk(history: &mut Vec<ConversationMessage>, text: &str, timestamp_ms: u64) -> bool {
    if let Some(last) = history.last_mut() {
        if last.role == Role::Agent {
            last.content.push_str(text);
            last.timestamp_ms = timestamp_ms;
            return false;
        }
    }
    history.push(ConversationMessage::new(Role::Agent, text, timestamp_ms));
    true
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
