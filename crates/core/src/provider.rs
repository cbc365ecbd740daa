// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Types crossing the execution-backend boundary.

use crate::agent::AgentId;
use crate::job::{HistoryEntry, JobId, Usage};
use crate::session::SessionId;
use serde::{Deserialize, Serialize};

/// Identifier of a configured provider (a routing-table key, not a random id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(pub String);

impl ProviderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Everything a backend needs to execute one job attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub job_id: JobId,
    pub agent_id: AgentId,
    pub session_id: SessionId,
    pub prompt: String,
    pub goal_type: String,
    #[serde(default)]
    pub conversation_history: Vec<HistoryEntry>,
    /// Checkpoint blob from a previous attempt, when resuming.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume: Option<serde_json::Value>,
    /// Payload appended by an approved gate decision, handed to the backend
    /// on the resumed attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_payload: Option<serde_json::Value>,
    pub timeout_ms: u64,
    /// Task-specific environment, injected explicitly on top of the
    /// inherited allowlist.
    #[serde(default)]
    pub env: Vec<(String, String)>,
}

/// Ordered output produced by an executing backend.
///
/// `Complete` is always the terminal event of a stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputEvent {
    Text {
        content: String,
    },
    ToolCall {
        name: String,
        #[serde(default)]
        arguments: serde_json::Value,
        /// Set when the call must pause for a human decision.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        approval: Option<ApprovalNeed>,
    },
    ToolResult {
        name: String,
        #[serde(default)]
        output: serde_json::Value,
    },
    Usage {
        prompt_tokens: u64,
        completion_tokens: u64,
    },
    Checkpoint {
        data: serde_json::Value,
    },
    Complete {
        status: ExecStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stdout: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        summary: Option<String>,
    },
}

/// Approval demand attached to a tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalNeed {
    pub action_type: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub detail: serde_json::Value,
    pub risk_level: crate::approval::RiskLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_seconds: Option<u64>,
}

/// Terminal status of one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecStatus {
    Completed,
    Failed,
    Cancelled,
    TimedOut,
}

crate::simple_display! {
    ExecStatus {
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
        TimedOut => "timed_out",
    }
}

/// Final outcome reported by a backend after `Complete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub status: ExecStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub usage: Usage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<crate::error::TaskError>,
}

/// What a backend advertises it can do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    pub streaming: bool,
    pub file_edit: bool,
    pub shell: bool,
    pub cancellation: bool,
    pub max_context_tokens: u32,
    #[serde(default)]
    pub goal_types: Vec<String>,
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
