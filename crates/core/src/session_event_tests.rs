// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

fn event(kind: SessionEventKind) -> SessionEvent {
    SessionEvent::new(
        JobId::from_string("job-1"),
        SessionId::from_string("ses-1"),
        AgentId::from_string("agt-1"),
        kind,
        1_000,
        json!({"k": "v"}),
    )
}

#[test]
fn serializes_kind_under_type_key() {
    let json = serde_json::to_value(event(SessionEventKind::ToolCall)).unwrap();
    assert_eq!(json["type"], "TOOL_CALL");
    assert_eq!(json["version"], SESSION_EVENT_VERSION);
    assert_eq!(json["sequence"], 0);
}

#[test]
fn null_data_is_omitted() {
    let mut e = event(SessionEventKind::Complete);
    e.data = serde_json::Value::Null;
    let json = serde_json::to_value(&e).unwrap();
    assert!(json.get("data").is_none());
}

#[test]
fn checkpoint_detection() {
    assert!(event(SessionEventKind::Checkpoint).is_checkpoint());
    assert!(!event(SessionEventKind::ToolResult).is_checkpoint());
}

#[test]
fn jsonl_round_trip() {
    let e = event(SessionEventKind::LlmResponse);
    let line = serde_json::to_string(&e).unwrap();
    assert!(!line.contains('\n'));
    let back: SessionEvent = serde_json::from_str(&line).unwrap();
    assert_eq!(back, e);
}
