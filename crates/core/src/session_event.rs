// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable per-job session-buffer records.
//!
//! One [`SessionEvent`] is one line in a job's `session-NNN.jsonl` file.
//! Records are appended, never rewritten; `sequence` is monotonic within a
//! session file and `CHECKPOINT.data` is the authoritative resume point.

use crate::agent::AgentId;
use crate::job::JobId;
use crate::session::SessionId;
use serde::{Deserialize, Serialize};

/// Format version written into every record.
pub const SESSION_EVENT_VERSION: u32 = 1;

/// What a session-buffer record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionEventKind {
    SessionStart,
    LlmRequest,
    LlmResponse,
    ToolCall,
    ToolResult,
    Checkpoint,
    Error,
    Complete,
}

crate::simple_display! {
    SessionEventKind {
        SessionStart => "SESSION_START",
        LlmRequest => "LLM_REQUEST",
        LlmResponse => "LLM_RESPONSE",
        ToolCall => "TOOL_CALL",
        ToolResult => "TOOL_RESULT",
        Checkpoint => "CHECKPOINT",
        Error => "ERROR",
        Complete => "COMPLETE",
    }
}

/// One record in a job's append-only session log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    pub version: u32,
    pub job_id: JobId,
    pub session_id: SessionId,
    pub agent_id: AgentId,
    /// Monotonic within a session file; assigned by the buffer on append.
    pub sequence: u64,
    #[serde(rename = "type")]
    pub kind: SessionEventKind,
    pub timestamp_ms: u64,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
}

impl SessionEvent {
    /// Build a record with `sequence` unset; the buffer assigns it on append.
    pub fn new(
        job_id: JobId,
        session_id: SessionId,
        agent_id: AgentId,
        kind: SessionEventKind,
        timestamp_ms: u64,
        data: serde_json::Value,
    ) -> Self {
        Self {
            version: SESSION_EVENT_VERSION,
            job_id,
            session_id,
            agent_id,
            sequence: 0,
            kind,
            timestamp_ms,
            data,
        }
    }

    pub fn is_checkpoint(&self) -> bool {
        self.kind == SessionEventKind::Checkpoint
    }
}

#[cfg(test)]
#[path = "session_event_tests.rs"]
mod tests;
