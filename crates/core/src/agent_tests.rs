// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    boot_to_hydrate = { AgentState::Booting, AgentState::Hydrating, true },
    hydrate_to_ready = { AgentState::Hydrating, AgentState::Ready, true },
    ready_to_executing = { AgentState::Ready, AgentState::Executing, true },
    executing_to_ready = { AgentState::Executing, AgentState::Ready, true },
    ready_to_draining = { AgentState::Ready, AgentState::Draining, true },
    executing_to_draining = { AgentState::Executing, AgentState::Draining, true },
    draining_to_terminated = { AgentState::Draining, AgentState::Terminated, true },
    boot_to_ready_skips = { AgentState::Booting, AgentState::Ready, false },
    ready_to_hydrating_back = { AgentState::Ready, AgentState::Hydrating, false },
    terminated_is_final = { AgentState::Terminated, AgentState::Booting, false },
    draining_back_to_ready = { AgentState::Draining, AgentState::Ready, false },
)]
fn transition_legality(from: AgentState, to: AgentState, legal: bool) {
    assert_eq!(from.can_transition_to(to), legal);
}

#[test]
fn only_terminated_is_terminal() {
    assert!(AgentState::Terminated.is_terminal());
    for state in [
        AgentState::Booting,
        AgentState::Hydrating,
        AgentState::Ready,
        AgentState::Executing,
        AgentState::Draining,
    ] {
        assert!(!state.is_terminal());
    }
}

#[test]
fn state_serializes_screaming() {
    let json = serde_json::to_string(&AgentState::Executing).unwrap();
    assert_eq!(json, "\"EXECUTING\"");
}

#[test]
fn spec_builder_defaults() {
    let spec = AgentSpec::builder().build();
    assert_eq!(spec.slug, "test-agent");
    assert!(spec.active);
    assert_eq!(spec.resource_limits.max_concurrent_jobs, 1);
}
