// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sessions and their append-only message history.

use super::helpers;
use super::{ControlStore, StoreError};
use fd_core::{
    AgentId, MessageRole, Session, SessionId, SessionMessage, SessionStatus, UserId,
};

impl ControlStore {
    /// Find the active session for (agent, user, channel), creating one when
    /// absent. Returns the session and whether it was created.
    ///
    /// Enforces the at-most-one-active invariant by always reusing an
    /// existing active row.
    pub fn find_or_create_session(
        &self,
        agent_id: AgentId,
        user_account_id: UserId,
        channel_id: Option<&str>,
        now_ms: u64,
    ) -> (Session, bool) {
        let mut state = self.inner.lock();
        if let Some(existing) = state.sessions.values().find(|s| {
            s.is_active()
                && s.agent_id == agent_id
                && s.user_account_id == user_account_id
                && s.channel_id.as_deref() == channel_id
        }) {
            return (existing.clone(), false);
        }

        let session = Session {
            id: SessionId::new(),
            agent_id,
            user_account_id,
            channel_id: channel_id.map(str::to_string),
            status: SessionStatus::Active,
            created_at_ms: now_ms,
        };
        state.sessions.insert(session.id.to_string(), session.clone());
        (session, true)
    }

    /// Get a session by ID or unique prefix.
    pub fn get_session(&self, id: &str) -> Option<Session> {
        helpers::find_by_prefix(&self.inner.lock().sessions, id).cloned()
    }

    /// List sessions belonging to an agent, newest first.
    pub fn sessions_for_agent(&self, agent_id: &str) -> Vec<Session> {
        let state = self.inner.lock();
        let mut sessions: Vec<Session> =
            state.sessions.values().filter(|s| s.agent_id == *agent_id).cloned().collect();
        sessions.sort_by_key(|s| std::cmp::Reverse(s.created_at_ms));
        sessions
    }

    /// Mark a session ended. Ending twice is a no-op.
    pub fn end_session(&self, id: &SessionId) -> Result<Session, StoreError> {
        let mut state = self.inner.lock();
        let session = state
            .sessions
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::SessionNotFound(id.to_string()))?;
        session.status = SessionStatus::Ended;
        Ok(session.clone())
    }

    /// Append one message to a session's history.
    pub fn append_message(
        &self,
        session_id: &SessionId,
        role: MessageRole,
        content: impl Into<String>,
        now_ms: u64,
    ) -> Result<SessionMessage, StoreError> {
        let mut state = self.inner.lock();
        if !state.sessions.contains_key(session_id.as_str()) {
            return Err(StoreError::SessionNotFound(session_id.to_string()));
        }
        let message = SessionMessage {
            session_id: *session_id,
            role,
            content: content.into(),
            created_at_ms: now_ms,
        };
        state.messages.entry(session_id.to_string()).or_default().push(message.clone());
        Ok(message)
    }

    /// All messages of a session in chronological order.
    pub fn messages_for(&self, session_id: &str) -> Vec<SessionMessage> {
        self.inner.lock().messages.get(session_id).cloned().unwrap_or_default()
    }

    /// The most recent `limit` messages excluding the latest one.
    ///
    /// Used by dispatch to assemble conversation history without the
    /// just-inserted user prompt.
    pub fn history_excluding_latest(&self, session_id: &str, limit: usize) -> Vec<SessionMessage> {
        let state = self.inner.lock();
        let Some(messages) = state.messages.get(session_id) else {
            return Vec::new();
        };
        let prior = &messages[..messages.len().saturating_sub(1)];
        let start = prior.len().saturating_sub(limit);
        prior[start..].to_vec()
    }
}
