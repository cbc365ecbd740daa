// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chat-to-agent binding lookup.

use fd_core::AgentId;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Resolves which agent owns a chat.
pub trait BindingResolver: Send + Sync {
    /// The agent bound to `(channel_type, chat_id)`, if any.
    fn resolve(&self, channel_type: &str, chat_id: &str) -> Option<AgentId>;
}

/// In-memory binding table.
#[derive(Default)]
pub struct InMemoryBindings {
    bindings: Mutex<HashMap<(String, String), AgentId>>,
}

impl InMemoryBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&self, channel_type: &str, chat_id: &str, agent_id: AgentId) {
        self.bindings
            .lock()
            .insert((channel_type.to_string(), chat_id.to_string()), agent_id);
    }

    pub fn unbind(&self, channel_type: &str, chat_id: &str) {
        self.bindings.lock().remove(&(channel_type.to_string(), chat_id.to_string()));
    }
}

impl BindingResolver for InMemoryBindings {
    fn resolve(&self, channel_type: &str, chat_id: &str) -> Option<AgentId> {
        self.bindings
            .lock()
            .get(&(channel_type.to_string(), chat_id.to_string()))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_resolve_unbind() {
        let bindings = InMemoryBindings::new();
        let agent = AgentId::from_string("agt-1");

        assert!(bindings.resolve("telegram", "100").is_none());
        bindings.bind("telegram", "100", agent);
        assert_eq!(bindings.resolve("telegram", "100"), Some(agent));
        assert!(bindings.resolve("discord", "100").is_none());

        bindings.unbind("telegram", "100");
        assert!(bindings.resolve("telegram", "100").is_none());
    }
}
