// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn only_pending_counts_as_undecided() {
    assert!(!ApprovalStatus::Pending.is_decided());
    assert!(ApprovalStatus::Approved.is_decided());
    assert!(ApprovalStatus::Rejected.is_decided());
    assert!(ApprovalStatus::Expired.is_decided());
}

#[test]
fn expiry_check_uses_status_and_deadline() {
    let request = ApprovalRequest::builder().expires_at_ms(60_000).build();
    assert!(!request.is_expired_at(59_999));
    assert!(request.is_expired_at(60_000));

    let decided = ApprovalRequest::builder()
        .status(ApprovalStatus::Approved)
        .expires_at_ms(60_000)
        .build();
    assert!(!decided.is_expired_at(120_000));
}

#[test]
fn risk_levels_order() {
    assert!(RiskLevel::Low < RiskLevel::Medium);
    assert!(RiskLevel::High < RiskLevel::Critical);
}

#[test]
fn status_serializes_screaming() {
    let json = serde_json::to_string(&ApprovalStatus::Pending).unwrap();
    assert_eq!(json, "\"PENDING\"");
}
