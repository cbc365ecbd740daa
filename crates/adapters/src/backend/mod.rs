// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution-backend boundary.
//!
//! Every provider — direct LLM API client, local process, echo — conforms
//! to [`ExecutionBackend`]. Backends hold no cross-task state, never block
//! the event loop, and report token usage when the provider exposes it.

mod echo;
#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use echo::EchoBackend;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{ScriptEntry, ScriptedBackend};

use async_trait::async_trait;
use fd_core::{Capabilities, ExecutionResult, OutputEvent, TaskError, TaskSpec};
use thiserror::Error;

/// Environment variables a process-spawning backend may inherit from the
/// daemon. Everything else comes explicitly from `TaskSpec::env`.
pub const ENV_ALLOWLIST: &[&str] = &["PATH", "HOME", "NODE_PATH", "LANG", "TERM"];

/// Errors from backend lifecycle operations (not task execution).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("backend not started")]
    NotStarted,
}

/// Result of a backend health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthStatus {
    pub healthy: bool,
    pub latency_ms: u64,
}

/// A running task: an ordered event stream plus a final result.
///
/// `events` yields strictly ordered [`OutputEvent`]s; `Complete` is always
/// the terminal event, after which `next_event` returns `None`. `cancel`
/// causes the stream to terminate and the result status to be `cancelled`.
#[async_trait]
pub trait ExecutionHandle: Send {
    /// Next event in the stream, `None` once the stream has terminated.
    async fn next_event(&mut self) -> Option<OutputEvent>;

    /// Final result; resolves once the stream has terminated.
    async fn result(&mut self) -> ExecutionResult;

    /// Ask the task to stop. Idempotent.
    fn cancel(&mut self, reason: &str);

    /// Inject a steering message into the next turn. Default no-op for
    /// backends without mid-turn input.
    fn steer(&mut self, message: &str) {
        let _ = message;
    }
}

/// Contract every LLM provider backend satisfies.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    async fn start(&self) -> Result<(), BackendError>;

    async fn stop(&self) -> Result<(), BackendError>;

    async fn health_check(&self) -> Result<HealthStatus, BackendError>;

    /// Begin executing a task. Failures returned here are classified at
    /// this boundary.
    async fn execute_task(&self, task: TaskSpec) -> Result<Box<dyn ExecutionHandle>, TaskError>;

    fn capabilities(&self) -> Capabilities;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
