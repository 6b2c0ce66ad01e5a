// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-workstream notifications surfaced to the operator.

use crate::workstream::WorkstreamId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a notification.
    pub struct NotificationId("ntf-");
}

/// Why a notification was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    ActionRequired,
    ReviewReady,
    Error,
    Info,
}

crate::simple_display! {
    NotificationKind {
        ActionRequired => "action-required",
        ReviewReady => "review-ready",
        Error => "error",
        Info => "info",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub timestamp_ms: u64,
    pub read: bool,
    pub workstream_id: WorkstreamId,
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        body: impl Into<String>,
        timestamp_ms: u64,
        workstream_id: WorkstreamId,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            kind,
            title: title.into(),
            body: body.into(),
            timestamp_ms,
            read: false,
            workstream_id,
        }
    }
}

#[cfg(test)]
#[path = "notification_tests.rs"]
mod tests;
