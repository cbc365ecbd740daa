// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process control store: jobs, sessions, approvals, agents.
//!
//! The store stands in for the transactional relational backend. A single
//! lock serializes every mutation, which is what gives `claim_due_job` its
//! `UPDATE … RETURNING` atomicity; the control plane is single-writer by
//! design.

mod agents;
mod approvals;
mod helpers;
mod jobs;
mod sessions;

use fd_core::{AgentSpec, ApprovalRequest, AuditEntry, Job, Session, SessionMessage};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors from control-store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("job not found: {0}")]
    JobNotFound(String),
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error("approval not found: {0}")]
    ApprovalNotFound(String),
    #[error("agent not found: {0}")]
    AgentNotFound(String),
    #[error("invalid status transition: {0} → {1}")]
    InvalidTransition(String, String),
}

#[derive(Debug, Default)]
pub(crate) struct StoreState {
    pub(crate) jobs: HashMap<String, Job>,
    pub(crate) sessions: HashMap<String, Session>,
    /// Messages per session, in append order.
    pub(crate) messages: HashMap<String, Vec<SessionMessage>>,
    pub(crate) approvals: HashMap<String, ApprovalRequest>,
    /// Audit entries per approval, in insertion order. Append-only.
    pub(crate) audit: HashMap<String, Vec<AuditEntry>>,
    pub(crate) agents: HashMap<String, AgentSpec>,
}

/// Shared handle to the control store.
#[derive(Clone, Default)]
pub struct ControlStore {
    pub(crate) inner: Arc<Mutex<StoreState>>,
}

impl ControlStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
#[path = "../state_tests/mod.rs"]
mod tests;
