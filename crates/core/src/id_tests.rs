// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::WorkstreamId;

#[test]
fn new_ids_carry_the_prefix() {
    let id = WorkstreamId::new();
    assert!(id.as_str().starts_with("wst-"));
    assert_eq!(id.as_str().len(), ID_MAX_LEN);
}

#[test]
fn ids_are_unique() {
    let a = WorkstreamId::new();
    let b = WorkstreamId::new();
    assert_ne!(a, b);
}

#[test]
fn from_string_roundtrips() {
    let id: WorkstreamId = "wst-custom".into();
    assert_eq!(id.as_str(), "wst-custom");
    assert_eq!(id, *"wst-custom");
}

#[test]
fn suffix_strips_prefix() {
    let id = WorkstreamId::from_string("wst-abc123");
    assert_eq!(id.suffix(), "abc123");
}

#[test]
fn short_truncates_suffix() {
    let id = WorkstreamId::from_string("wst-abcdefgh");
    assert_eq!(id.short(3), "abc");
}

#[test]
fn serde_roundtrip() {
    let id = WorkstreamId::new();
    let json = serde_json::to_string(&id).unwrap();
    let parsed: WorkstreamId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn short_helper_truncates() {
    assert_eq!(short("hello world", 5), "hello");
    assert_eq!(short("hi", 5), "hi");
}
