// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use flotilla_core::envelope::Envelope;
use serde_json::json;

fn session_update(update: Value) -> Envelope {
    Envelope::notification("session/update", json!({"sessionId": "s1", "update": update}))
}

#[test]
fn classifies_text_chunk() {
    let env = session_update(json!({"sessionUpdate": "agent_message_chunk", "content": {"text": "hi"}}));
    assert_eq!(classify(&env), Classification::Text { text: "hi".to_string() });
}

#[test]
fn missing_chunk_text_becomes_empty_string() {
    let env = session_update(json!({"sessionUpdate": "agent_message_chunk", "content": {}}));
    assert_eq!(classify(&env), Classification::Text { text: String::new() });
}

#[test]
fn classifies_thought_chunk() {
    let env = session_update(json!({"sessionUpdate": "agent_thought_chunk", "content": {"text": "hmm"}}));
    assert_eq!(classify(&env), Classification::Thought { text: "hmm".to_string() });
}

#[test]
fn classifies_tool_call_start() {
    let env = session_update(json!({"sessionUpdate": "tool_call", "id": "t1", "title": "run", "status": "pending"}));
    assert_eq!(
        classify(&env),
        Classification::ToolCall { id: "t1".to_string(), title: "run".to_string(), status: "pending".to_string() }
    );
}

#[test]
fn classifies_tool_call_update() {
    let env = session_update(json!({
        "sessionUpdate": "tool_call_update",
        "fields": {"id": "t1", "status": "completed", "content": "done"},
    }));
    match classify(&env) {
        Classification::ToolUpdate { id, status, content } => {
            assert_eq!(id, "t1");
            assert_eq!(status, "completed");
            assert_eq!(content, Some(json!("done")));
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn classifies_permission_request() {
    let env = Envelope::request(
        1,
        "request_permission",
        json!({
            "toolCallUpdate": {"fields": {"title": "Write file"}},
            "options": [{"id": "a", "kind": "allow_once"}, {"id": "r", "kind": "reject_once"}],
        }),
    );
    match classify(&env) {
        Classification::PermissionRequest { tool_title, options, .. } => {
            assert_eq!(tool_title, "Write file");
            assert_eq!(options.len(), 2);
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn unknown_session_update_discriminator_is_ignored() {
    let env = session_update(json!({"sessionUpdate": "plan"}));
    assert_eq!(classify(&env), Classification::Unknown);
}

#[test]
fn response_envelope_is_unknown_to_the_classifier() {
    let env = Envelope::response(1.into(), json!({}));
    assert_eq!(classify(&env), Classification::Unknown);
}

#[yare::parameterized(
    other_method = { Envelope::notification("foo/bar", json!({})) },
    no_update_field = { Envelope::notification("session/update", json!({})) },
)]
fn unknown_shapes_never_panic(env: Envelope) {
    assert_eq!(classify(&env), Classification::Unknown);
}
