// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Echo backend: replies with the prompt text. The minimal conforming
//! provider, useful for wiring checks and as a routing fallback in dev.

use super::{BackendError, ExecutionBackend, ExecutionHandle, HealthStatus};
use async_trait::async_trait;
use fd_core::{Capabilities, ExecStatus, ExecutionResult, OutputEvent, TaskError, TaskSpec, Usage};
use std::collections::VecDeque;

#[derive(Default)]
pub struct EchoBackend;

impl EchoBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ExecutionBackend for EchoBackend {
    async fn start(&self) -> Result<(), BackendError> {
        Ok(())
    }

    async fn stop(&self) -> Result<(), BackendError> {
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthStatus, BackendError> {
        Ok(HealthStatus { healthy: true, latency_ms: 0 })
    }

    async fn execute_task(&self, task: TaskSpec) -> Result<Box<dyn ExecutionHandle>, TaskError> {
        let reply = format!("echo: {}", task.prompt);
        let events = VecDeque::from(vec![
            OutputEvent::Text { content: reply.clone() },
            OutputEvent::Usage {
                prompt_tokens: task.prompt.len() as u64,
                completion_tokens: reply.len() as u64,
            },
            OutputEvent::Complete {
                status: ExecStatus::Completed,
                stdout: Some(reply),
                summary: None,
            },
        ]);
        Ok(Box::new(EchoHandle { events, cancelled: false, stdout: None, usage: Usage::default() }))
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            streaming: true,
            file_edit: false,
            shell: false,
            cancellation: true,
            max_context_tokens: 8_192,
            goal_types: vec!["research".to_string()],
        }
    }
}

struct EchoHandle {
    events: VecDeque<OutputEvent>,
    cancelled: bool,
    stdout: Option<String>,
    usage: Usage,
}

#[async_trait]
impl ExecutionHandle for EchoHandle {
    async fn next_event(&mut self) -> Option<OutputEvent> {
        if self.cancelled {
            return None;
        }
        let event = self.events.pop_front()?;
        match &event {
            OutputEvent::Complete { stdout, .. } => self.stdout = stdout.clone(),
            OutputEvent::Usage { prompt_tokens, completion_tokens } => self.usage.add(Usage {
                prompt_tokens: *prompt_tokens,
                completion_tokens: *completion_tokens,
            }),
            _ => {}
        }
        Some(event)
    }

    async fn result(&mut self) -> ExecutionResult {
        if self.cancelled {
            return ExecutionResult {
                status: ExecStatus::Cancelled,
                stdout: None,
                summary: None,
                usage: self.usage,
                error: None,
            };
        }
        // Drain whatever the caller has not consumed yet
        while self.next_event().await.is_some() {}
        ExecutionResult {
            status: ExecStatus::Completed,
            stdout: self.stdout.clone(),
            summary: None,
            usage: self.usage,
            error: None,
        }
    }

    fn cancel(&mut self, _reason: &str) {
        self.cancelled = true;
        self.events.clear();
    }
}
