// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events the coordinator fans out to observers. Delivered synchronously,
//! one callback `(workstreamId, event)` per subscriber, in the exact order
//! their triggering inbound envelopes were processed — never buffered,
//! never replayed to a late subscriber.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::envelope::RequestId;
use crate::message::ConversationMessage;
use crate::notification::Notification;
use crate::state::WorkstreamState;
use crate::tool_call::ToolCall;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoordinatorEvent {
    /// A new conversation message was appended (fired once per coalescing
    /// run, on the first chunk only).
    Message { message: ConversationMessage },
    /// `activity` or `state` changed without a new message.
    StateChanged { state: WorkstreamState, activity: String },
    /// A tool call entered `activeTools[w]`.
    ToolCall { tool: ToolCall },
    /// A tool call's status changed; `removed` is true once it left
    /// `activeTools[w]` (invariant T1).
    ToolUpdate { tool: ToolCall, removed: bool },
    /// A `request_permission` call arrived and is now pending.
    PermissionRequest {
        request_id: RequestId,
        tool_title: String,
        tool_input: Value,
        options: Vec<crate::permission::PermissionOption>,
    },
    /// A notification was appended to the workstream.
    Notification { notification: Notification },
    /// The workstream transitioned to `error`; `message` is the cause.
    Error { message: String },
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
