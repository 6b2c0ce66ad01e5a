// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::FakeClock;
use crate::tool_call::ToolStatus;

#[test]
fn sanitizer_matches_the_documented_example() {
    assert_eq!(sanitize_name("Hello, World! 123"), "hello--world--123");
}

#[test]
fn sanitizer_truncates_to_fifty_chars() {
    let raw = "a".repeat(80);
    assert_eq!(sanitize_name(&raw).len(), 50);
}

#[test]
fn sanitizer_is_idempotent() {
    let once = sanitize_name("Fix The Bug");
    let twice = sanitize_name(&once);
    assert_eq!(once, twice);
}

#[test]
fn new_workstream_starts_in_starting_state() {
    let clock = FakeClock::new();
    let ws = Workstream::new(WorkstreamId::new(), "fix-x", "do it", &clock);
    assert_eq!(ws.state, WorkstreamState::Starting);
    assert!(!ws.has_worktree());
    assert_eq!(ws.created_at_ms, ws.last_activity_ms);
}

#[test]
fn tool_lifecycle_goes_zero_one_zero() {
    let clock = FakeClock::new();
    let mut ws = Workstream::new(WorkstreamId::new(), "w", "t", &clock);
    assert_eq!(ws.active_tools.len(), 0);

    ws.upsert_tool_call(ToolCall::new("t1", "run"), 1);
    assert_eq!(ws.active_tools.len(), 1);
    assert_eq!(ws.active_tools["t1"].status, ToolStatus::Pending);

    let updated = ws.update_tool_status("t1", ToolStatus::Completed, 2).unwrap();
    assert_eq!(updated.status, ToolStatus::Completed);
    assert_eq!(ws.active_tools.len(), 0);
}

#[test]
fn non_terminal_update_keeps_tool_pending_in_the_map() {
    let clock = FakeClock::new();
    let mut ws = Workstream::new(WorkstreamId::new(), "w", "t", &clock);
    ws.upsert_tool_call(ToolCall::new("t1", "run"), 1);
    ws.update_tool_status("t1", ToolStatus::Pending, 2);
    assert_eq!(ws.active_tools.len(), 1);
}

#[test]
fn update_for_unknown_tool_id_is_a_noop() {
    let clock = FakeClock::new();
    let mut ws = Workstream::new(WorkstreamId::new(), "w", "t", &clock);
    assert!(ws.update_tool_status("missing", ToolStatus::Completed, 1).is_none());
}
