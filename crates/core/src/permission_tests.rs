// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn outcome_serializes_to_the_bit_exact_payload() {
    let outcome = PermissionOutcome::selected("a");
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json, serde_json::json!({"outcome": {"selected": {"optionId": "a"}}}));
}

#[tokio::test]
async fn resolver_channel_delivers_the_outcome() {
    let (tx, rx): (PermissionResolver, _) = tokio::sync::oneshot::channel();
    tx.send(PermissionOutcome::selected("r")).unwrap();
    let outcome = rx.await.unwrap();
    assert_eq!(outcome.outcome.selected.option_id, "r");
}
