// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Response bodies returned by the daemon.

use fd_core::{
    ApprovalRequest, ApprovalStatus, AuditEntry, RiskLevel, Session, SessionMessage,
    SessionStatus,
};
use serde::{Deserialize, Serialize};

/// Problem-details-style error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into(), message: None }
    }

    pub fn with_message(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self { error: error.into(), message: Some(message.into()) }
    }
}

/// One approval in list responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalSummary {
    pub id: String,
    pub job_id: String,
    pub agent_id: String,
    pub action_type: String,
    pub action_summary: String,
    pub risk_level: RiskLevel,
    pub status: ApprovalStatus,
    pub created_at_ms: u64,
    pub expires_at_ms: u64,
}

impl From<&ApprovalRequest> for ApprovalSummary {
    fn from(request: &ApprovalRequest) -> Self {
        Self {
            id: request.id.to_string(),
            job_id: request.job_id.to_string(),
            agent_id: request.agent_id.to_string(),
            action_type: request.action_type.clone(),
            action_summary: request.action_summary.clone(),
            risk_level: request.risk_level,
            status: request.status,
            created_at_ms: request.created_at_ms,
            expires_at_ms: request.expires_at_ms,
        }
    }
}

/// Full approval detail. The token hash never leaves the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalDetail {
    #[serde(flatten)]
    pub summary: ApprovalSummary,
    #[serde(default)]
    pub action_detail: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<String>,
}

impl From<&ApprovalRequest> for ApprovalDetail {
    fn from(request: &ApprovalRequest) -> Self {
        Self {
            summary: ApprovalSummary::from(request),
            action_detail: request.action_detail.clone(),
            decided_at_ms: request.decided_at_ms,
            decided_by: request.decided_by.clone(),
        }
    }
}

/// `201` body of approval creation: the one-time token rides along.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalCreated {
    #[serde(flatten)]
    pub detail: ApprovalDetail,
    /// Returned exactly once; only its hash is stored.
    pub token: String,
}

/// One audit-trail entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntryBody {
    pub action: String,
    pub actor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub at_ms: u64,
}

impl From<&AuditEntry> for AuditEntryBody {
    fn from(entry: &AuditEntry) -> Self {
        Self {
            action: entry.action.to_string(),
            actor: entry.actor.clone(),
            ip: entry.ip.clone(),
            user_agent: entry.user_agent.clone(),
            reason: entry.reason.clone(),
            at_ms: entry.at_ms,
        }
    }
}

/// `202` body of a steer request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SteerAccepted {
    pub steer_message_id: String,
    pub agent_id: String,
    pub priority: String,
}

/// One session in list responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub agent_id: String,
    pub user_account_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    pub status: SessionStatus,
    pub created_at_ms: u64,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.to_string(),
            agent_id: session.agent_id.to_string(),
            user_account_id: session.user_account_id.to_string(),
            channel_id: session.channel_id.clone(),
            status: session.status,
            created_at_ms: session.created_at_ms,
        }
    }
}

/// One message in a session transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageBody {
    pub role: String,
    pub content: String,
    pub created_at_ms: u64,
}

impl From<&SessionMessage> for MessageBody {
    fn from(message: &SessionMessage) -> Self {
        Self {
            role: message.role.to_string(),
            content: message.content.clone(),
            created_at_ms: message.created_at_ms,
        }
    }
}

/// Body of `GET /status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusBody {
    pub uptime_secs: u64,
    pub jobs_active: usize,
    pub agents: Vec<AgentStateBody>,
    pub breakers: Vec<BreakerBody>,
}

/// One agent's lifecycle state in status responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStateBody {
    pub agent_id: String,
    pub state: String,
}

/// One provider breaker in status responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerBody {
    pub provider_id: String,
    pub state: String,
    pub consecutive_failures: u32,
}
