// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conversation sessions and their messages.

use crate::agent::AgentId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a conversation session.
    pub struct SessionId("ses-");
}

crate::define_id! {
    /// Unique identifier for a user account.
    pub struct UserId("usr-");
}

/// Session liveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Ended,
}

crate::simple_display! {
    SessionStatus {
        Active => "active",
        Ended => "ended",
    }
}

/// A conversation between one user and one agent over one channel.
///
/// At most one `active` session exists per (agent, user, channel).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub agent_id: AgentId,
    pub user_account_id: UserId,
    /// `"<channel_type>:<chat_id>"`, absent for API-originated sessions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    pub status: SessionStatus,
    pub created_at_ms: u64,
}

impl Session {
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }
}

/// Who authored a session message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

crate::simple_display! {
    MessageRole {
        User => "user",
        Assistant => "assistant",
    }
}

/// One message in a session. Append-only, ordered by `created_at_ms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMessage {
    pub session_id: SessionId,
    pub role: MessageRole,
    pub content: String,
    pub created_at_ms: u64,
}

crate::builder! {
    pub struct SessionBuilder => Session {
        set {
            id: SessionId = SessionId::from_string("ses-test1"),
            agent_id: AgentId = AgentId::from_string("agt-test1"),
            user_account_id: UserId = UserId::from_string("usr-test1"),
            status: SessionStatus = SessionStatus::Active,
            created_at_ms: u64 = 0,
        }
        option {
            channel_id: String = Some("telegram:100".to_string()),
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
