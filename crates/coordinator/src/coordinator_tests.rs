// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::json;

use flotilla_core::envelope::{Envelope, RequestId};
use flotilla_core::event::CoordinatorEvent;
use flotilla_core::state::WorkstreamState;

use yare::parameterized;

use super::*;
use crate::test_support::{FakeTransport, FakeWorktreeProvider};

#[parameterized(
    pending = {"pending", Some(flotilla_core::tool_call::ToolStatus::Pending)},
    completed = {"completed", Some(flotilla_core::tool_call::ToolStatus::Completed)},
    failed = {"failed", Some(flotilla_core::tool_call::ToolStatus::Failed)},
    unknown = {"in_progress", None},
)]
fn parse_tool_status_matches_the_wire_vocabulary(raw: &str, expected: Option<flotilla_core::tool_call::ToolStatus>) {
    assert_eq!(parse_tool_status(raw), expected);
}

fn make_coordinator(
    use_worktrees: bool,
    worktree_available: bool,
) -> (Arc<Coordinator>, Arc<FakeTransport>) {
    let transport = FakeTransport::new("sess-1");
    transport.set_response("session/new", json!({ "sessionId": "acp-sess-1" }));
    let worktree = FakeWorktreeProvider::new(worktree_available);
    let captured = Arc::clone(&transport);
    let config =
        CoordinatorConfig { server_base_url: "http://example.invalid".to_string(), repo_path: PathBuf::from("/repo"), use_worktrees };
    let coordinator = Coordinator::new(config, worktree, move || Arc::clone(&captured) as Arc<dyn TransportClient>);
    (coordinator, transport)
}

fn collect_events(coordinator: &Arc<Coordinator>) -> (SubscriptionHandle, Arc<Mutex<Vec<(WorkstreamId, CoordinatorEvent)>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let handle = coordinator.subscribe(Arc::new(move |id, event| sink.lock().push((id, event))));
    (handle, events)
}

#[tokio::test]
async fn create_workstream_connects_and_reaches_running() {
    let (coordinator, transport) = make_coordinator(false, false);
    let id = coordinator.create_workstream("Fix the bug", "fix it").await.unwrap();

    let workstream = coordinator.get_workstream(id).unwrap();
    assert_eq!(workstream.state, WorkstreamState::Running);
    assert_eq!(workstream.session_id.as_deref(), Some("acp-sess-1"));
    assert!(!workstream.has_worktree());
    assert!(transport.sent_requests().iter().any(|(m, _)| m == "initialize"));
}

#[tokio::test]
async fn create_workstream_provisions_a_working_copy_when_enabled() {
    let (coordinator, _transport) = make_coordinator(true, true);
    let id = coordinator.create_workstream("Fix the bug", "fix it").await.unwrap();

    let workstream = coordinator.get_workstream(id).unwrap();
    assert!(workstream.has_worktree());
    assert_eq!(workstream.branch_name.as_deref(), Some("goose/fix-the-bug"));
}

#[tokio::test]
async fn create_workstream_without_an_available_repo_still_reaches_running() {
    let (coordinator, _transport) = make_coordinator(true, false);
    let id = coordinator.create_workstream("Fix the bug", "fix it").await.unwrap();

    let workstream = coordinator.get_workstream(id).unwrap();
    assert!(!workstream.has_worktree());
    assert_eq!(workstream.state, WorkstreamState::Running);
}

#[tokio::test]
async fn create_workstream_handshake_failure_transitions_to_error_and_reraises() {
    let (coordinator, transport) = make_coordinator(false, false);
    transport.fail_to_connect();

    let err = coordinator.create_workstream("doomed", "task").await;
    assert!(err.is_err());
}

#[tokio::test]
async fn start_task_prefixes_the_prompt_with_the_worktree_location() {
    let (coordinator, transport) = make_coordinator(true, true);
    let id = coordinator.create_workstream("Fix the bug", "run the tests").await.unwrap();

    coordinator.start_task(id).await.unwrap();

    let (_, prompt) = transport
        .sent_requests()
        .into_iter()
        .find(|(method, _)| method == "session/prompt")
        .expect("a session/prompt request was sent");
    let text = prompt["prompt"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("You are working in a git worktree at:"));
    assert!(text.ends_with("run the tests"));
}

#[tokio::test]
async fn send_prompt_failure_transitions_workstream_to_error() {
    let (coordinator, transport) = make_coordinator(false, false);
    let id = coordinator.create_workstream("task", "task").await.unwrap();
    transport.fail_next_send();

    let err = coordinator.send_prompt(id, "go").await;
    assert!(err.is_err());
    let workstream = coordinator.get_workstream(id).unwrap();
    assert!(matches!(workstream.state, WorkstreamState::Error(_)));
}

#[tokio::test]
async fn pause_and_resume_round_trip() {
    let (coordinator, _transport) = make_coordinator(false, false);
    let id = coordinator.create_workstream("task", "task").await.unwrap();

    coordinator.pause_workstream(id).unwrap();
    assert_eq!(coordinator.get_workstream(id).unwrap().state, WorkstreamState::Paused);

    coordinator.resume_workstream(id).unwrap();
    assert_eq!(coordinator.get_workstream(id).unwrap().state, WorkstreamState::Running);
}

#[tokio::test]
async fn pause_is_a_no_op_from_a_non_running_state() {
    let (coordinator, _transport) = make_coordinator(false, false);
    let id = coordinator.create_workstream("task", "task").await.unwrap();
    coordinator.pause_workstream(id).unwrap();

    // Already paused: pausing again is a silent no-op, not an error.
    coordinator.pause_workstream(id).unwrap();
    assert_eq!(coordinator.get_workstream(id).unwrap().state, WorkstreamState::Paused);
}

#[tokio::test]
async fn stop_workstream_is_idempotent() {
    let (coordinator, _transport) = make_coordinator(false, false);
    let id = coordinator.create_workstream("task", "task").await.unwrap();

    coordinator.stop_workstream(id, false).await;
    assert!(coordinator.get_workstream(id).is_none());
    coordinator.stop_workstream(id, false).await;
}

#[tokio::test]
async fn tool_call_then_terminal_update_removes_it_from_active_tools() {
    let (coordinator, transport) = make_coordinator(false, false);
    let id = coordinator.create_workstream("task", "task").await.unwrap();
    let (_handle, events) = collect_events(&coordinator);

    transport.push_message(Envelope::notification(
        "session/update",
        json!({ "update": { "sessionUpdate": "tool_call", "id": "t1", "title": "Run tests", "status": "pending" } }),
    ));
    assert_eq!(coordinator.get_active_tools(id).len(), 1);

    transport.push_message(Envelope::notification(
        "session/update",
        json!({ "update": { "sessionUpdate": "tool_call_update", "fields": { "id": "t1", "status": "completed" } } }),
    ));
    assert!(coordinator.get_active_tools(id).is_empty());

    let kinds: Vec<_> = events
        .lock()
        .iter()
        .filter_map(|(_, e)| match e {
            CoordinatorEvent::ToolCall { .. } => Some("call"),
            CoordinatorEvent::ToolUpdate { removed, .. } => Some(if *removed { "removed" } else { "updated" }),
            _ => None,
        })
        .collect();
    assert_eq!(kinds, vec!["call", "removed"]);
}

#[tokio::test]
async fn tool_update_for_an_unknown_id_is_absorbed_without_an_event() {
    let (coordinator, transport) = make_coordinator(false, false);
    let id = coordinator.create_workstream("task", "task").await.unwrap();
    let (_handle, events) = collect_events(&coordinator);

    transport.push_message(Envelope::notification(
        "session/update",
        json!({ "update": { "sessionUpdate": "tool_call_update", "fields": { "id": "ghost", "status": "completed" } } }),
    ));

    assert!(coordinator.get_active_tools(id).is_empty());
    assert!(events.lock().is_empty());
}

#[tokio::test]
async fn consecutive_agent_chunks_coalesce_into_one_message_event() {
    let (coordinator, transport) = make_coordinator(false, false);
    let id = coordinator.create_workstream("task", "task").await.unwrap();
    let (_handle, events) = collect_events(&coordinator);

    for chunk in ["Hel", "lo, ", "world"] {
        transport.push_message(Envelope::notification(
            "session/update",
            json!({ "update": { "sessionUpdate": "agent_message_chunk", "content": { "text": chunk } } }),
        ));
    }

    let workstream = coordinator.get_workstream(id).unwrap();
    assert_eq!(workstream.message_history.len(), 1);
    assert_eq!(workstream.message_history[0].content, "Hello, world");

    let message_events = events.lock().iter().filter(|(_, e)| matches!(e, CoordinatorEvent::Message { .. })).count();
    assert_eq!(message_events, 1);
}

#[tokio::test]
async fn permission_request_blocks_until_respond_to_permission_resolves_it() {
    let (coordinator, transport) = make_coordinator(false, false);
    let id = coordinator.create_workstream("task", "task").await.unwrap();
    let (_handle, events) = collect_events(&coordinator);

    let params = json!({
        "toolCallUpdate": { "fields": { "title": "Delete file" } },
        "options": [{ "id": "allow-once", "kind": "allow_once" }],
    });
    let handler_task = {
        let transport = Arc::clone(&transport);
        let params = params.clone();
        tokio::spawn(async move { transport.invoke_handler("request_permission", RequestId::Number(7), params).await })
    };

    // Let the spawned handler run up to its `rx.await` suspension point.
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }

    let pending = coordinator.get_pending_permission(id).expect("permission should be pending");
    assert_eq!(pending.tool_title, "Delete file");
    assert_eq!(coordinator.get_workstream(id).unwrap().state, WorkstreamState::Waiting);

    coordinator.respond_to_permission(id, "allow-once").unwrap();

    let result = tokio::time::timeout(Duration::from_secs(1), handler_task).await.unwrap().unwrap();
    let value = result.expect("handler should resolve successfully");
    assert_eq!(value["outcome"]["selected"]["optionId"], "allow-once");

    assert!(coordinator.get_pending_permission(id).is_none());
    assert_eq!(coordinator.get_workstream(id).unwrap().state, WorkstreamState::Running);
    assert!(events.lock().iter().any(|(_, e)| matches!(e, CoordinatorEvent::PermissionRequest { .. })));
}

#[tokio::test]
async fn a_second_permission_request_is_rejected_while_one_is_pending() {
    let (coordinator, transport) = make_coordinator(false, false);
    let id = coordinator.create_workstream("task", "task").await.unwrap();

    let params = json!({
        "toolCallUpdate": { "fields": { "title": "Delete file" } },
        "options": [{ "id": "allow-once", "kind": "allow_once" }],
    });
    let first = {
        let transport = Arc::clone(&transport);
        let params = params.clone();
        tokio::spawn(async move { transport.invoke_handler("request_permission", RequestId::Number(1), params).await })
    };
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }

    let second = transport.invoke_handler("request_permission", RequestId::Number(2), params).await;
    assert_eq!(
        second,
        Err(flotilla_core::envelope::JsonRpcError::new(
            flotilla_core::envelope::JsonRpcError::PERMISSION_ALREADY_PENDING,
            "permission already pending for this workstream",
        ))
    );

    coordinator.respond_to_permission(id, "allow-once").unwrap();
    first.await.unwrap().unwrap();
}

#[tokio::test]
async fn respond_to_permission_without_a_pending_request_is_an_error() {
    let (coordinator, _transport) = make_coordinator(false, false);
    let id = coordinator.create_workstream("task", "task").await.unwrap();

    let err = coordinator.respond_to_permission(id, "allow-once").unwrap_err();
    assert!(matches!(err, CoordinatorError::NoPendingPermission(_)));
}
