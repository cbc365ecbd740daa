// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent registry: operator-configured fleet members.

use super::helpers;
use super::ControlStore;
use fd_core::AgentSpec;

impl ControlStore {
    /// Insert or replace an agent spec. Slugs are unique and stable; a
    /// re-registration under the same ID replaces the previous version.
    pub fn upsert_agent(&self, spec: AgentSpec) {
        self.inner.lock().agents.insert(spec.id.to_string(), spec);
    }

    /// Get an agent by ID (or unique prefix) or by slug.
    pub fn get_agent(&self, id_or_slug: &str) -> Option<AgentSpec> {
        let state = self.inner.lock();
        if let Some(spec) = helpers::find_by_prefix(&state.agents, id_or_slug) {
            return Some(spec.clone());
        }
        state.agents.values().find(|a| a.slug == id_or_slug).cloned()
    }

    /// All registered agents, active and deactivated.
    pub fn list_agents(&self) -> Vec<AgentSpec> {
        let mut agents: Vec<AgentSpec> = self.inner.lock().agents.values().cloned().collect();
        agents.sort_by(|a, b| a.slug.cmp(&b.slug));
        agents
    }

    /// Deactivate an agent. Agents are never destroyed.
    pub fn deactivate_agent(&self, id_or_slug: &str) -> bool {
        let mut state = self.inner.lock();
        let id = match helpers::find_by_prefix(&state.agents, id_or_slug) {
            Some(spec) => spec.id.to_string(),
            None => match state.agents.values().find(|a| a.slug == id_or_slug) {
                Some(spec) => spec.id.to_string(),
                None => return false,
            },
        };
        if let Some(spec) = state.agents.get_mut(&id) {
            spec.active = false;
            return true;
        }
        false
    }
}
