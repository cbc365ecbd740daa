// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent identity and lifecycle state machine.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a fleet agent.
    pub struct AgentId("agt-");
}

crate::define_id! {
    /// Unique identifier for a steering message.
    pub struct SteerId("stm-");
}

/// Static description of an agent as configured by an operator.
///
/// Agents are deactivated, never destroyed; `resource_limits` is immutable
/// for a given agent version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub id: AgentId,
    /// Unique, stable, human-facing handle.
    pub slug: String,
    pub role: String,
    pub model_config: ModelConfig,
    pub resource_limits: ResourceLimits,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Model selection for an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model: String,
    pub max_output_tokens: u32,
    /// Preferred provider; routing may override when the breaker is open.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_hint: Option<String>,
}

/// Per-agent resource ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    pub max_concurrent_jobs: u32,
    pub memory_mb: u32,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self { max_concurrent_jobs: 1, memory_mb: 512 }
    }
}

/// Lifecycle state of an active agent.
///
/// ```text
/// BOOTING → HYDRATING → READY → EXECUTING → DRAINING → TERMINATED
/// ```
///
/// Executing agents return to `Ready` when their job releases the lifecycle;
/// any non-terminal state may crash straight to `Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentState {
    Booting,
    Hydrating,
    Ready,
    Executing,
    Draining,
    Terminated,
}

crate::simple_display! {
    AgentState {
        Booting => "booting",
        Hydrating => "hydrating",
        Ready => "ready",
        Executing => "executing",
        Draining => "draining",
        Terminated => "terminated",
    }
}

impl AgentState {
    pub fn is_terminal(self) -> bool {
        matches!(self, AgentState::Terminated)
    }

    /// Whether a non-crash transition from `self` to `next` is legal.
    ///
    /// Crashes bypass this check: any non-terminal state may be forced to
    /// `Terminated` through the lifecycle manager's crash path.
    pub fn can_transition_to(self, next: AgentState) -> bool {
        use AgentState::*;
        matches!(
            (self, next),
            (Booting, Hydrating)
                | (Hydrating, Ready)
                | (Ready, Executing)
                | (Executing, Ready)
                | (Ready, Draining)
                | (Executing, Draining)
                | (Draining, Terminated)
        )
    }
}

crate::builder! {
    pub struct AgentSpecBuilder => AgentSpec {
        into {
            slug: String = "test-agent",
            role: String = "research",
        }
        set {
            id: AgentId = AgentId::from_string("agt-test1"),
            model_config: ModelConfig = ModelConfig {
                model: "claude-sonnet".to_string(),
                max_output_tokens: 4096,
                provider_hint: None,
            },
            resource_limits: ResourceLimits = ResourceLimits::default(),
            active: bool = true,
        }
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
