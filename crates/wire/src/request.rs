// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request bodies accepted by the daemon.

use fd_core::RiskLevel;
use serde::{Deserialize, Serialize};

fn default_ttl_seconds() -> u64 {
    3_600
}

fn default_risk() -> RiskLevel {
    RiskLevel::Medium
}

/// Body of `POST /jobs/:job_id/approval`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateApprovalBody {
    pub action_type: String,
    pub action_summary: String,
    #[serde(default)]
    pub action_detail: serde_json::Value,
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
    #[serde(default = "default_risk")]
    pub risk_level: RiskLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_payload: Option<serde_json::Value>,
}

/// Body of `POST /approvals/:id/decide`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecideBody {
    /// `"APPROVED"` or `"REJECTED"`.
    pub decision: fd_core::ApprovalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Body of `POST /approvals/token/decide`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecideTokenBody {
    pub token: String,
    pub decision: fd_core::ApprovalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Body of `POST /agents/:agent_id/steer`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SteerBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}
