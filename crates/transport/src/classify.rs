// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The protocol parser (C2): a pure function from an inbound
//! [`Envelope`] to a tagged [`Classification`]. Never mutates state, never
//! panics on missing nested fields — absent chunk text becomes `""`.

use flotilla_core::envelope::Envelope;
use flotilla_core::permission::PermissionOption;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Text { text: String },
    Thought { text: String },
    ToolCall { id: String, title: String, status: String },
    ToolUpdate { id: String, status: String, content: Option<Value> },
    PermissionRequest { tool_title: String, tool_input: Value, options: Vec<PermissionOption> },
    Unknown,
}

fn str_field(v: &Value, key: &str) -> String {
    v.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

/// Classify one inbound envelope.
pub fn classify(envelope: &Envelope) -> Classification {
    let Some(method) = envelope.method.as_deref() else {
        return Classification::Unknown;
    };
    let params = envelope.params.clone().unwrap_or(Value::Null);

    if method == "request_permission" {
        let tool_title = params
            .get("toolCallUpdate")
            .and_then(|t| t.get("fields"))
            .map(|f| str_field(f, "title"))
            .unwrap_or_default();
        let tool_input = params
            .get("toolCallUpdate")
            .and_then(|t| t.get("fields"))
            .cloned()
            .unwrap_or(Value::Null);
        let options = params
            .get("options")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|o| serde_json::from_value::<PermissionOption>(o.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();
        return Classification::PermissionRequest { tool_title, tool_input, options };
    }

    if method != "session/update" {
        return Classification::Unknown;
    }

    let Some(update) = params.get("update") else {
        return Classification::Unknown;
    };
    let kind = str_field(update, "sessionUpdate");

    match kind.as_str() {
        "agent_message_chunk" => {
            let text = update.get("content").map(|c| str_field(c, "text")).unwrap_or_default();
            Classification::Text { text }
        }
        "agent_thought_chunk" => {
            let text = update.get("content").map(|c| str_field(c, "text")).unwrap_or_default();
            Classification::Thought { text }
        }
        "tool_call" => Classification::ToolCall {
            id: str_field(update, "id"),
            title: str_field(update, "title"),
            status: str_field(update, "status"),
        },
        "tool_call_update" => {
            let fields = update.get("fields").cloned().unwrap_or(Value::Null);
            Classification::ToolUpdate {
                id: str_field(&fields, "id"),
                status: str_field(&fields, "status"),
                content: fields.get("content").cloned(),
            }
        }
        _ => Classification::Unknown,
    }
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
