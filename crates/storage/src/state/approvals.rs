// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Approval requests and their immutable audit trail.

use super::helpers;
use super::{ControlStore, StoreError};
use fd_core::{ApprovalId, ApprovalRequest, ApprovalStatus, AuditEntry};

impl ControlStore {
    pub fn insert_approval(&self, request: ApprovalRequest) {
        self.inner.lock().approvals.insert(request.id.to_string(), request);
    }

    /// Get an approval by ID or unique prefix.
    pub fn get_approval(&self, id: &str) -> Option<ApprovalRequest> {
        helpers::find_by_prefix(&self.inner.lock().approvals, id).cloned()
    }

    /// Resolve an approval by its stored token hash.
    pub fn find_approval_by_token_hash(&self, token_hash: &str) -> Option<ApprovalRequest> {
        self.inner.lock().approvals.values().find(|a| a.token_hash == token_hash).cloned()
    }

    /// List approvals, optionally filtered by status, newest first.
    pub fn list_approvals(&self, status: Option<ApprovalStatus>) -> Vec<ApprovalRequest> {
        let state = self.inner.lock();
        let mut approvals: Vec<ApprovalRequest> = state
            .approvals
            .values()
            .filter(|a| status.is_none_or(|s| a.status == s))
            .cloned()
            .collect();
        approvals.sort_by_key(|a| std::cmp::Reverse(a.created_at_ms));
        approvals
    }

    /// Pending approvals whose deadline has passed.
    pub fn expired_approvals(&self, now_ms: u64) -> Vec<ApprovalRequest> {
        self.inner
            .lock()
            .approvals
            .values()
            .filter(|a| a.is_expired_at(now_ms))
            .cloned()
            .collect()
    }

    /// Apply a mutation to an approval row under the store lock.
    ///
    /// Decision linearization: callers check-and-set the status inside the
    /// closure while the row lock is held.
    pub fn update_approval(
        &self,
        id: &ApprovalId,
        mutate: impl FnOnce(&mut ApprovalRequest),
    ) -> Result<ApprovalRequest, StoreError> {
        let mut state = self.inner.lock();
        let approval = state
            .approvals
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::ApprovalNotFound(id.to_string()))?;
        mutate(approval);
        Ok(approval.clone())
    }

    /// Append an audit entry. The trail is append-only and never rewritten.
    pub fn append_audit(&self, entry: AuditEntry) {
        self.inner
            .lock()
            .audit
            .entry(entry.approval_id.to_string())
            .or_default()
            .push(entry);
    }

    /// Audit entries for an approval in insertion order.
    pub fn audit_for(&self, approval_id: &str) -> Vec<AuditEntry> {
        self.inner.lock().audit.get(approval_id).cloned().unwrap_or_default()
    }
}
