// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn output_events_tag_snake_case() {
    let event = OutputEvent::Text { content: "hi".into() };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "text");

    let complete =
        OutputEvent::Complete { status: ExecStatus::Completed, stdout: None, summary: None };
    let json = serde_json::to_value(&complete).unwrap();
    assert_eq!(json["type"], "complete");
    assert_eq!(json["status"], "completed");
}

#[test]
fn tool_call_approval_is_optional() {
    let call = OutputEvent::ToolCall {
        name: "shell".into(),
        arguments: json!({"cmd": "rm -rf /tmp/x"}),
        approval: Some(ApprovalNeed {
            action_type: "shell".into(),
            summary: "delete files".into(),
            detail: serde_json::Value::Null,
            risk_level: crate::RiskLevel::High,
            ttl_seconds: None,
        }),
    };
    let json = serde_json::to_value(&call).unwrap();
    assert_eq!(json["approval"]["risk_level"], "high");

    let plain = OutputEvent::ToolCall {
        name: "search".into(),
        arguments: json!({}),
        approval: None,
    };
    let json = serde_json::to_value(&plain).unwrap();
    assert!(json.get("approval").is_none());
}

#[test]
fn provider_id_is_transparent() {
    let id = ProviderId::new("anthropic");
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"anthropic\"");
    assert_eq!(id.as_str(), "anthropic");
}
