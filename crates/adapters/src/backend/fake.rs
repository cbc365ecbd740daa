// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted backend for tests: plays back queued event scripts, records
//! executed tasks and steering input.

use super::{BackendError, ExecutionBackend, ExecutionHandle, HealthStatus};
use async_trait::async_trait;
use fd_core::{
    Capabilities, ExecStatus, ExecutionResult, OutputEvent, TaskError, TaskSpec, Usage,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// One queued behavior for the next `execute_task` call.
pub enum ScriptEntry {
    /// Stream these events in order.
    Events(Vec<OutputEvent>),
    /// Fail task startup with a classified error.
    Fail(TaskError),
    /// Never produce an event until cancelled (for timeout tests).
    Hang,
}

#[derive(Default)]
struct ScriptedState {
    scripts: VecDeque<ScriptEntry>,
    executed: Vec<TaskSpec>,
    steered: Vec<String>,
}

/// Test backend that plays back scripts queued with [`ScriptedBackend::push_script`].
///
/// With an empty queue it behaves like a completed no-op task, which keeps
/// incidental jobs in integration tests from hanging.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    state: Arc<Mutex<ScriptedState>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_script(&self, events: Vec<OutputEvent>) {
        self.state.lock().scripts.push_back(ScriptEntry::Events(events));
    }

    pub fn push_failure(&self, error: TaskError) {
        self.state.lock().scripts.push_back(ScriptEntry::Fail(error));
    }

    pub fn push_hang(&self) {
        self.state.lock().scripts.push_back(ScriptEntry::Hang);
    }

    /// A minimal text + complete script.
    pub fn push_reply(&self, text: &str) {
        self.push_script(vec![
            OutputEvent::Text { content: text.to_string() },
            OutputEvent::Complete {
                status: ExecStatus::Completed,
                stdout: Some(text.to_string()),
                summary: None,
            },
        ]);
    }

    /// Tasks executed so far, in order.
    pub fn executed(&self) -> Vec<TaskSpec> {
        self.state.lock().executed.clone()
    }

    /// Steering messages observed by any handle.
    pub fn steered(&self) -> Vec<String> {
        self.state.lock().steered.clone()
    }
}

#[async_trait]
impl ExecutionBackend for ScriptedBackend {
    async fn start(&self) -> Result<(), BackendError> {
        Ok(())
    }

    async fn stop(&self) -> Result<(), BackendError> {
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthStatus, BackendError> {
        Ok(HealthStatus { healthy: true, latency_ms: 1 })
    }

    async fn execute_task(&self, task: TaskSpec) -> Result<Box<dyn ExecutionHandle>, TaskError> {
        let entry = {
            let mut state = self.state.lock();
            state.executed.push(task);
            state.scripts.pop_front()
        };
        let handle = |events: VecDeque<OutputEvent>, hang: bool| ScriptedHandle {
            events,
            hang,
            cancelled: false,
            shared: self.state.clone(),
            stdout: None,
            usage: Usage::default(),
        };
        match entry {
            Some(ScriptEntry::Fail(error)) => Err(error),
            Some(ScriptEntry::Hang) => Ok(Box::new(handle(VecDeque::new(), true))),
            Some(ScriptEntry::Events(events)) => Ok(Box::new(handle(events.into(), false))),
            None => Ok(Box::new(handle(
                VecDeque::from(vec![OutputEvent::Complete {
                    status: ExecStatus::Completed,
                    stdout: None,
                    summary: None,
                }]),
                false,
            ))),
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            streaming: true,
            file_edit: true,
            shell: true,
            cancellation: true,
            max_context_tokens: 200_000,
            goal_types: vec!["research".to_string(), "build".to_string()],
        }
    }
}

struct ScriptedHandle {
    events: VecDeque<OutputEvent>,
    hang: bool,
    cancelled: bool,
    shared: Arc<Mutex<ScriptedState>>,
    stdout: Option<String>,
    usage: Usage,
}

#[async_trait]
impl ExecutionHandle for ScriptedHandle {
    async fn next_event(&mut self) -> Option<OutputEvent> {
        if self.cancelled {
            return None;
        }
        if self.hang {
            // Parked until the driving future is dropped or cancel is called
            std::future::pending::<()>().await;
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

    fn steer(&mut self, message: &str) {
        self.shared.lock().steered.push(message.to_string());
    }
}
