// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-plane events published on the engine event bus.
//!
//! Components coordinate by message passing: the lifecycle manager, router,
//! scheduler, and approval gate publish these; the stream manager and
//! dispatcher subscribe. Serializes as `{"type": "topic:name", ...fields}`;
//! unknown type tags deserialize to `Custom`.

use crate::agent::{AgentId, AgentState};
use crate::approval::{ApprovalId, ApprovalStatus, RiskLevel};
use crate::job::{JobId, JobStatus};
use crate::provider::ProviderId;
use crate::session::SessionId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // -- agent lifecycle --
    #[serde(rename = "agent:state")]
    AgentState {
        agent_id: AgentId,
        from: AgentState,
        to: AgentState,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    #[serde(rename = "agent:unhealthy")]
    AgentUnhealthy { agent_id: AgentId, missed_heartbeats: u32 },

    #[serde(rename = "agent:steer")]
    AgentSteer { agent_id: AgentId, steer_message_id: String, priority: String },

    // -- jobs --
    #[serde(rename = "job:created")]
    JobCreated { job_id: JobId, agent_id: AgentId, session_id: SessionId },

    #[serde(rename = "job:status")]
    JobStatusChanged {
        job_id: JobId,
        agent_id: AgentId,
        status: JobStatus,
        attempt: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        last_error: Option<String>,
    },

    // -- routing --
    #[serde(rename = "route:skipped")]
    RouteSkipped { agent_id: AgentId, provider_id: ProviderId, reason: String },

    #[serde(rename = "route:failover")]
    RouteFailover { agent_id: AgentId, provider_id: ProviderId, preferred: ProviderId },

    #[serde(rename = "route:exhausted")]
    RouteExhausted { agent_id: AgentId, skipped: u32, reason: String },

    // -- approvals --
    #[serde(rename = "approval:requested")]
    ApprovalRequested {
        approval_id: ApprovalId,
        job_id: JobId,
        agent_id: AgentId,
        risk_level: RiskLevel,
        action_summary: String,
    },

    #[serde(rename = "approval:decided")]
    ApprovalDecided {
        approval_id: ApprovalId,
        job_id: JobId,
        agent_id: AgentId,
        decision: ApprovalStatus,
    },

    #[serde(rename = "approval:expired")]
    ApprovalExpired { approval_id: ApprovalId, job_id: JobId, agent_id: AgentId },

    /// Unknown event type (forward compatibility).
    #[serde(other)]
    Custom,
}

impl Event {
    /// Stable event name used for SSE framing and logging.
    pub fn name(&self) -> &'static str {
        match self {
            Event::AgentState { .. } => "agent:state",
            Event::AgentUnhealthy { .. } => "agent:unhealthy",
            Event::AgentSteer { .. } => "agent:steer",
            Event::JobCreated { .. } => "job:created",
            Event::JobStatusChanged { .. } => "job:status",
            Event::RouteSkipped { .. } => "route:skipped",
            Event::RouteFailover { .. } => "route:failover",
            Event::RouteExhausted { .. } => "route:exhausted",
            Event::ApprovalRequested { .. } => "approval:requested",
            Event::ApprovalDecided { .. } => "approval:decided",
            Event::ApprovalExpired { .. } => "approval:expired",
            Event::Custom => "custom",
        }
    }

    /// The agent whose stream this event belongs on, if any.
    pub fn agent_id(&self) -> Option<&AgentId> {
        match self {
            Event::AgentState { agent_id, .. }
            | Event::AgentUnhealthy { agent_id, .. }
            | Event::AgentSteer { agent_id, .. }
            | Event::JobCreated { agent_id, .. }
            | Event::JobStatusChanged { agent_id, .. }
            | Event::RouteSkipped { agent_id, .. }
            | Event::RouteFailover { agent_id, .. }
            | Event::RouteExhausted { agent_id, .. }
            | Event::ApprovalRequested { agent_id, .. }
            | Event::ApprovalDecided { agent_id, .. }
            | Event::ApprovalExpired { agent_id, .. } => Some(agent_id),
            Event::Custom => None,
        }
    }

    /// Whether approval-stream subscribers should see this event.
    pub fn is_approval_event(&self) -> bool {
        matches!(
            self,
            Event::ApprovalRequested { .. }
                | Event::ApprovalDecided { .. }
                | Event::ApprovalExpired { .. }
        )
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
