// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fd_core::{ApprovalRequest, ApprovalStatus, RiskLevel};

#[test]
fn create_body_defaults() {
    let body: CreateApprovalBody = serde_json::from_str(
        r#"{"action_type": "shell", "action_summary": "run rm"}"#,
    )
    .unwrap();
    assert_eq!(body.ttl_seconds, 3_600);
    assert_eq!(body.risk_level, RiskLevel::Medium);
    assert!(body.resume_payload.is_none());
}

#[test]
fn decide_body_parses_screaming_decision() {
    let body: DecideBody = serde_json::from_str(r#"{"decision": "APPROVED"}"#).unwrap();
    assert_eq!(body.decision, ApprovalStatus::Approved);
}

#[test]
fn error_body_omits_absent_message() {
    let body = ErrorBody::new("not_found");
    let json = serde_json::to_value(&body).unwrap();
    assert_eq!(json, serde_json::json!({"error": "not_found"}));

    let body = ErrorBody::with_message("conflict", "wrong state");
    let json = serde_json::to_value(&body).unwrap();
    assert_eq!(json["message"], "wrong state");
}

#[test]
fn approval_detail_flattens_summary_and_hides_token_hash() {
    let request = ApprovalRequest::builder().token_hash("super-secret-hash").build();
    let detail = ApprovalDetail::from(&request);
    let json = serde_json::to_value(&detail).unwrap();

    assert_eq!(json["id"], "apr-test1");
    assert_eq!(json["status"], "PENDING");
    assert!(json.get("token_hash").is_none(), "hash never leaves the daemon");
}

#[test]
fn steer_accepted_round_trips() {
    let body = SteerAccepted {
        steer_message_id: "stm-1".to_string(),
        agent_id: "agt-1".to_string(),
        priority: "normal".to_string(),
    };
    let json = serde_json::to_string(&body).unwrap();
    let back: SteerAccepted = serde_json::from_str(&json).unwrap();
    assert_eq!(back.steer_message_id, "stm-1");
}
