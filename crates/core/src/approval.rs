// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Approval requests for human-in-the-loop gating of sensitive actions.

use crate::agent::AgentId;
use crate::job::JobId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for an approval request.
    pub struct ApprovalId("apr-");
}

/// Shortest TTL an approval request may carry.
pub const MIN_TTL_SECONDS: u64 = 60;
/// Longest TTL an approval request may carry (7 days).
pub const MAX_TTL_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Lifecycle of an approval request. Only `Pending` may transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
    Expired,
}

crate::simple_display! {
    ApprovalStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
        Expired => "expired",
    }
}

impl ApprovalStatus {
    pub fn is_decided(self) -> bool {
        !matches!(self, ApprovalStatus::Pending)
    }
}

/// How dangerous the gated action is, for display and alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

crate::simple_display! {
    RiskLevel {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

/// A pending (or decided) request to let an agent perform a gated action.
///
/// The decision token is cryptographically random and returned to the caller
/// exactly once; only its keyed hash is stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub id: ApprovalId,
    pub job_id: JobId,
    pub agent_id: AgentId,
    pub action_type: String,
    pub action_summary: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub action_detail: serde_json::Value,
    /// Keyed hash of the decision token; plaintext is never stored or logged.
    pub token_hash: String,
    pub risk_level: RiskLevel,
    pub status: ApprovalStatus,
    /// Blob appended to the job when the decision is `Approved`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_payload: Option<serde_json::Value>,
    pub created_at_ms: u64,
    pub expires_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<String>,
}

impl ApprovalRequest {
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        self.status == ApprovalStatus::Pending && now_ms >= self.expires_at_ms
    }
}

/// What an audit entry records about an approval transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Approved,
    Rejected,
    Expired,
}

crate::simple_display! {
    AuditAction {
        Created => "created",
        Approved => "approved",
        Rejected => "rejected",
        Expired => "expired",
    }
}

/// Immutable audit-trail entry for an approval request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: uuid::Uuid,
    pub approval_id: ApprovalId,
    pub action: AuditAction,
    /// Actor principal ("system" for sweeper transitions).
    pub actor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub at_ms: u64,
}

crate::builder! {
    pub struct ApprovalRequestBuilder => ApprovalRequest {
        into {
            action_type: String = "shell",
            action_summary: String = "run a shell command",
            token_hash: String = "hash",
        }
        set {
            id: ApprovalId = ApprovalId::from_string("apr-test1"),
            job_id: JobId = JobId::from_string("job-test1"),
            agent_id: AgentId = AgentId::from_string("agt-test1"),
            action_detail: serde_json::Value = serde_json::Value::Null,
            risk_level: RiskLevel = RiskLevel::Medium,
            status: ApprovalStatus = ApprovalStatus::Pending,
            created_at_ms: u64 = 0,
            expires_at_ms: u64 = 60_000,
        }
        option {
            resume_payload: serde_json::Value = None,
            decided_at_ms: u64 = None,
            decided_by: String = None,
        }
    }
}

#[cfg(test)]
#[path = "approval_tests.rs"]
mod tests;
