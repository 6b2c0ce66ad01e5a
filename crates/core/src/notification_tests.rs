// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::WorkstreamId;

#[test]
fn new_notification_starts_unread() {
    let n = Notification::new(NotificationKind::Info, "t", "b", 0, WorkstreamId::new());
    assert!(!n.read);
}

#[yare::parameterized(
    action_required = { NotificationKind::ActionRequired, "action-required" },
    review_ready = { NotificationKind::ReviewReady, "review-ready" },
    error = { NotificationKind::Error, "error" },
    info = { NotificationKind::Info, "info" },
)]
fn kind_display(kind: NotificationKind, expected: &str) {
    assert_eq!(kind.to_string(), expected);
}

#[test]
fn serde_roundtrip() {
    let n = Notification::new(NotificationKind::ActionRequired, "title", "body", 5, WorkstreamId::new());
    let json = serde_json::to_string(&n).unwrap();
    let parsed: Notification = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.id, n.id);
    assert_eq!(parsed.kind, NotificationKind::ActionRequired);
}
