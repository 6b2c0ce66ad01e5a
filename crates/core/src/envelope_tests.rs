// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn response_has_id_and_no_method() {
    let env = Envelope::response(RequestId::Number(1), serde_json::json!({"ok": true}));
    assert!(env.is_response());
    assert!(!env.is_peer_request());
    assert!(!env.is_notification());
}

#[test]
fn peer_request_has_id_and_method() {
    let env = Envelope::request(RequestId::Number(42), "request_permission", serde_json::json!({}));
    assert!(env.is_peer_request());
    assert!(!env.is_response());
    assert!(!env.is_notification());
}

#[test]
fn notification_has_method_and_no_id() {
    let env = Envelope::notification("session/update", serde_json::json!({}));
    assert!(env.is_notification());
    assert!(!env.is_response());
    assert!(!env.is_peer_request());
}

#[test]
fn request_id_accepts_string_or_number_on_the_wire() {
    let numeric: Envelope = serde_json::from_str(r#"{"jsonrpc":"2.0","id":42,"result":{}}"#).unwrap();
    assert_eq!(numeric.id, Some(RequestId::Number(42)));

    let stringy: Envelope = serde_json::from_str(r#"{"jsonrpc":"2.0","id":"abc","result":{}}"#).unwrap();
    assert_eq!(stringy.id, Some(RequestId::String("abc".to_string())));
}

#[test]
fn error_response_serializes_error_member() {
    let env = Envelope::error_response(
        RequestId::Number(42),
        JsonRpcError::new(JsonRpcError::PERMISSION_ALREADY_PENDING, "permission already pending for this workstream"),
    );
    let json = serde_json::to_value(&env).unwrap();
    assert_eq!(json["error"]["code"], -32001);
    assert!(json.get("result").is_none());
}
