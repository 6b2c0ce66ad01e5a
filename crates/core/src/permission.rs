// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Permission-request correlation (invariant P1).
//!
//! A [`PendingPermission`] and its [`PermissionResolver`] are created and
//! destroyed together by the coordinator; this module only defines the
//! data shapes, not the table that enforces the 1:1 relationship (that
//! lives in `flotilla-coordinator`, which is the single writer).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::envelope::RequestId;
use crate::workstream::WorkstreamId;

/// One choice offered to the operator for a pending tool-call permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOption {
    pub id: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// The full payload of an inbound `request_permission` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingPermission {
    /// The `id` the remote assigned to its `request_permission` call; the
    /// response envelope we eventually send back must echo it.
    pub request_id: RequestId,
    pub workstream_id: WorkstreamId,
    pub tool_title: String,
    pub tool_input: Value,
    pub options: Vec<PermissionOption>,
}

/// The payload `respondToPermission` resolves the pending request with
/// `{outcome: {selected: {optionId}}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionOutcome {
    pub outcome: PermissionSelected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionSelected {
    pub selected: PermissionSelectedOption,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionSelectedOption {
    #[serde(rename = "optionId")]
    pub option_id: String,
}

impl PermissionOutcome {
    pub fn selected(option_id: impl Into<String>) -> Self {
        Self {
            outcome: PermissionSelected {
                selected: PermissionSelectedOption { option_id: option_id.into() },
            },
        }
    }
}

/// The out-parameter channel held open while a workstream is blocked on a
/// permission decision; resolving it unblocks the deferred transport
/// response handler.
pub type PermissionResolver = tokio::sync::oneshot::Sender<PermissionOutcome>;

#[cfg(test)]
#[path = "permission_tests.rs"]
mod tests;
