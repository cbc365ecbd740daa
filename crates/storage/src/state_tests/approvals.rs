// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::store;
use fd_core::{ApprovalRequest, ApprovalStatus, AuditAction, AuditEntry};

fn entry(approval_id: &str, action: AuditAction, at_ms: u64) -> AuditEntry {
    AuditEntry {
        id: uuid::Uuid::new_v4(),
        approval_id: approval_id.into(),
        action,
        actor: "tester".to_string(),
        ip: None,
        user_agent: None,
        reason: None,
        at_ms,
    }
}

#[test]
fn insert_and_lookup_by_prefix_and_token_hash() {
    let store = store();
    store.insert_approval(
        ApprovalRequest::builder().id("apr-abc123".into()).token_hash("h1").build(),
    );

    assert!(store.get_approval("apr-abc").is_some());
    assert!(store.find_approval_by_token_hash("h1").is_some());
    assert!(store.find_approval_by_token_hash("h2").is_none());
}

#[test]
fn list_filters_by_status() {
    let store = store();
    store.insert_approval(
        ApprovalRequest::builder()
            .id("apr-1".into())
            .status(ApprovalStatus::Pending)
            .created_at_ms(1)
            .build(),
    );
    store.insert_approval(
        ApprovalRequest::builder()
            .id("apr-2".into())
            .status(ApprovalStatus::Approved)
            .created_at_ms(2)
            .build(),
    );

    assert_eq!(store.list_approvals(Some(ApprovalStatus::Pending)).len(), 1);
    let all = store.list_approvals(None);
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, "apr-2", "newest first");
}

#[test]
fn expired_approvals_only_pending_past_deadline() {
    let store = store();
    store.insert_approval(
        ApprovalRequest::builder().id("apr-live".into()).expires_at_ms(100).build(),
    );
    store.insert_approval(
        ApprovalRequest::builder()
            .id("apr-done".into())
            .status(ApprovalStatus::Approved)
            .expires_at_ms(100)
            .build(),
    );

    assert!(store.expired_approvals(50).is_empty());
    let expired = store.expired_approvals(150);
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].id, "apr-live");
}

#[test]
fn audit_trail_is_ordered() {
    let store = store();
    store.append_audit(entry("apr-1", AuditAction::Created, 1));
    store.append_audit(entry("apr-1", AuditAction::Approved, 2));

    let trail = store.audit_for("apr-1");
    assert_eq!(trail.len(), 2);
    assert_eq!(trail[0].action, AuditAction::Created);
    assert_eq!(trail[1].action, AuditAction::Approved);
    assert!(store.audit_for("apr-2").is_empty());
}
