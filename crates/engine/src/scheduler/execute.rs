// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job execution: recover, hydrate, route, stream, terminate.

use super::JobScheduler;
use crate::approval::CreateApproval;
use crate::lifecycle::LifecycleError;
use crate::router::Route;
use fd_core::{
    Clock, ErrorClass, ExecStatus, Job, JobPayload, JobStatus, OutputEvent, SessionEvent,
    SessionEventKind, TaskError, TaskSpec, Usage,
};
use fd_storage::{BufferError, SessionBuffer, StoreError};
use serde_json::json;
use std::time::Duration;

/// Faults that interrupt a drive before its normal terminal path.
enum DriveFault {
    Store(StoreError),
    /// Session-buffer I/O failure; propagated as a transient task failure.
    Buffer(BufferError),
}

impl From<StoreError> for DriveFault {
    fn from(err: StoreError) -> Self {
        DriveFault::Store(err)
    }
}

impl From<BufferError> for DriveFault {
    fn from(err: BufferError) -> Self {
        DriveFault::Buffer(err)
    }
}

enum EventOutcome {
    Continue,
    Suspended,
    Complete { status: ExecStatus, stdout: Option<String>, summary: Option<String> },
}

impl<C: Clock> JobScheduler<C> {
    /// Drive one claimed job to a terminal status, a suspension, or a
    /// released claim. The claim is this worker's exclusive lease.
    pub(crate) async fn drive(&self, job: Job) -> Result<(), StoreError> {
        // Corrupt checkpoints never reach a backend
        if !job.checkpoint_intact() {
            return self.fail_terminal(&job, JobStatus::DeadLetter, "checkpoint_crc_mismatch");
        }

        // Bring the agent to EXECUTING (boot + hydrate as needed)
        match self.lifecycle.ensure_executing(&job.agent_id, &job.id).await {
            Ok(_) => {}
            Err(LifecycleError::Busy(_)) => {
                return self.release_claim(&job, self.config.busy_requeue_delay);
            }
            Err(LifecycleError::InCooldown { remaining_ms }) => {
                return self.release_claim(&job, Duration::from_millis(remaining_ms));
            }
            Err(err) => {
                return self.handle_failure(&job, &TaskError::from_message(err.to_string()));
            }
        }

        // Route; every provider rejecting is a retryable condition
        let route = match self.router.route_with_failover(&job.agent_id, self.clock.now()) {
            Ok(route) => route,
            Err(err) => {
                self.release_lifecycle(&job);
                return self.handle_failure(
                    &job,
                    &TaskError::new(ErrorClass::Transient, err.to_string()),
                );
            }
        };

        // Bound per-provider concurrency; the permit rides the whole drive
        let _permit = match self
            .router
            .acquire_slot(&route.provider_id, Duration::from_millis(job.timeout_ms))
            .await
        {
            Ok(permit) => permit,
            Err(err) => {
                self.router.record_outcome(&route.provider_id, false, None, self.clock.now());
                self.release_lifecycle(&job);
                return self.handle_failure(
                    &job,
                    &TaskError::new(ErrorClass::Timeout, err.to_string()),
                );
            }
        };

        match self.drive_routed(&job, &route).await {
            Ok(()) => Ok(()),
            Err(DriveFault::Store(err)) => {
                // Internal invariant break: release the probe slot and the
                // agent before surfacing
                self.router.record_outcome(&route.provider_id, false, None, self.clock.now());
                self.release_lifecycle(&job);
                Err(err)
            }
            Err(DriveFault::Buffer(err)) => {
                self.router.record_outcome(&route.provider_id, false, None, self.clock.now());
                self.release_lifecycle(&job);
                self.handle_failure(&job, &TaskError::from_message(err.to_string()))
            }
        }
    }

    /// The routed portion of a drive: session buffer, backend stream,
    /// terminal bookkeeping.
    async fn drive_routed(&self, job: &Job, route: &Route) -> Result<(), DriveFault> {
        // Fresh session file for this attempt
        let mut buffer = SessionBuffer::open(&self.config.buffer_root, job.id)?;
        self.append_and_broadcast(
            &mut buffer,
            job,
            SessionEventKind::SessionStart,
            json!({"attempt": job.attempt, "provider": route.provider_id}),
        )?;

        let task = self.build_task(job);
        self.append_and_broadcast(
            &mut buffer,
            job,
            SessionEventKind::LlmRequest,
            json!({"prompt": task.prompt, "goal_type": task.goal_type}),
        )?;

        let mut handle = match route.backend.execute_task(task).await {
            Ok(handle) => handle,
            Err(error) => {
                self.append_and_broadcast(
                    &mut buffer,
                    job,
                    SessionEventKind::Error,
                    json!({"class": error.class, "message": error.message}),
                )?;
                self.router.record_outcome(
                    &route.provider_id,
                    false,
                    Some(error.class),
                    self.clock.now(),
                );
                self.release_lifecycle(job);
                return Ok(self.handle_failure(job, &error)?);
            }
        };

        // Steering registered for the whole execution window
        let mut steer_rx = self.lifecycle.register_steer_listener(&job.agent_id);
        let cancel = self.cancellation_token();
        let deadline = tokio::time::Instant::now() + Duration::from_millis(job.timeout_ms);
        let mut usage = Usage::default();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    handle.cancel("shutting down");
                    self.router.record_outcome(&route.provider_id, false, None, self.clock.now());
                    self.release_lifecycle(job);
                    return Ok(self.release_claim(job, Duration::ZERO)?);
                }
                steer = steer_rx.recv() => {
                    if let Some(steer) = steer {
                        handle.steer(&steer.message);
                    }
                    continue;
                }
                event = tokio::time::timeout_at(deadline, handle.next_event()) => {
                    let Ok(event) = event else {
                        // Wall clock exceeded: terminal, counts on the breaker
                        handle.cancel("timeout");
                        self.append_and_broadcast(
                            &mut buffer,
                            job,
                            SessionEventKind::Error,
                            json!({"class": ErrorClass::Timeout, "message": "task timeout"}),
                        )?;
                        self.router.record_outcome(
                            &route.provider_id,
                            false,
                            Some(ErrorClass::Timeout),
                            self.clock.now(),
                        );
                        self.release_lifecycle(job);
                        return Ok(self.fail_terminal(job, JobStatus::TimedOut, "task timeout")?);
                    };
                    let Some(event) = event else {
                        let error = TaskError::new(
                            ErrorClass::Unknown,
                            "backend stream ended without complete",
                        );
                        self.append_and_broadcast(
                            &mut buffer,
                            job,
                            SessionEventKind::Error,
                            json!({"class": error.class, "message": error.message}),
                        )?;
                        self.router.record_outcome(
                            &route.provider_id,
                            false,
                            Some(error.class),
                            self.clock.now(),
                        );
                        self.release_lifecycle(job);
                        return Ok(self.handle_failure(job, &error)?);
                    };

                    match self.process_event(&mut buffer, job, route, event, &mut usage).await? {
                        EventOutcome::Continue => {}
                        EventOutcome::Suspended => {
                            handle.cancel("waiting for approval");
                            return Ok(());
                        }
                        EventOutcome::Complete { status, stdout, summary } => {
                            return Ok(self
                                .finish(job, route, handle.as_mut(), status, stdout, summary, usage)
                                .await?);
                        }
                    }
                }
            }
        }
    }

    /// Handle one backend output event.
    async fn process_event(
        &self,
        buffer: &mut SessionBuffer,
        job: &Job,
        route: &Route,
        event: OutputEvent,
        usage: &mut Usage,
    ) -> Result<EventOutcome, DriveFault> {
        match event {
            OutputEvent::Text { content } => {
                self.append_and_broadcast(
                    buffer,
                    job,
                    SessionEventKind::LlmResponse,
                    json!({"text": content}),
                )?;
            }
            OutputEvent::ToolCall { name, arguments, approval } => {
                self.append_and_broadcast(
                    buffer,
                    job,
                    SessionEventKind::ToolCall,
                    json!({"name": name, "arguments": arguments}),
                )?;
                if let Some(need) = approval {
                    // The call streamed fine; suspension is not a provider
                    // failure
                    self.router.record_outcome(&route.provider_id, true, None, self.clock.now());
                    self.release_lifecycle(job);
                    let created = self.gate.create_request(CreateApproval {
                        job_id: job.id,
                        agent_id: job.agent_id,
                        action_type: need.action_type,
                        action_summary: need.summary,
                        action_detail: need.detail,
                        ttl_seconds: need.ttl_seconds.unwrap_or(3_600),
                        risk_level: need.risk_level,
                        resume_payload: Some(json!({
                            "tool": name,
                            "arguments": arguments,
                        })),
                        requested_by: format!("agent:{}", job.agent_id),
                    });
                    if let Err(err) = created {
                        tracing::error!(job_id = %job.id, error = %err, "approval create failed");
                        self.handle_failure(
                            job,
                            &TaskError::new(ErrorClass::Unknown, err.to_string()),
                        )?;
                    }
                    return Ok(EventOutcome::Suspended);
                }
            }
            OutputEvent::ToolResult { name, output } => {
                self.append_and_broadcast(
                    buffer,
                    job,
                    SessionEventKind::ToolResult,
                    json!({"name": name, "output": output}),
                )?;
            }
            OutputEvent::Usage { prompt_tokens, completion_tokens } => {
                usage.add(Usage { prompt_tokens, completion_tokens });
                self.streams.broadcast(
                    &job.agent_id,
                    "output:usage",
                    &json!({"prompt_tokens": prompt_tokens, "completion_tokens": completion_tokens}),
                );
            }
            OutputEvent::Checkpoint { data } => {
                self.append_and_broadcast(buffer, job, SessionEventKind::Checkpoint, data.clone())?;
                self.store.update_job(&job.id, |row| {
                    if let Err(err) = row.set_checkpoint(data) {
                        tracing::error!(job_id = %row.id, error = %err, "checkpoint not stored");
                    }
                })?;
            }
            OutputEvent::Complete { status, stdout, summary } => {
                self.append_and_broadcast(
                    buffer,
                    job,
                    SessionEventKind::Complete,
                    json!({"status": status, "usage": *usage}),
                )?;
                return Ok(EventOutcome::Complete { status, stdout, summary });
            }
        }
        Ok(EventOutcome::Continue)
    }

    /// Terminalize a completed stream.
    #[allow(clippy::too_many_arguments)]
    async fn finish(
        &self,
        job: &Job,
        route: &Route,
        handle: &mut dyn fd_adapters::ExecutionHandle,
        status: ExecStatus,
        stdout: Option<String>,
        summary: Option<String>,
        mut usage: Usage,
    ) -> Result<(), StoreError> {
        let now = self.clock.now();
        match status {
            ExecStatus::Completed => {
                let result = handle.result().await;
                usage.add(result.usage);
                let stdout = stdout.or(result.stdout);
                let summary = summary.or(result.summary);
                self.store.update_job(&job.id, |row| {
                    row.result = Some(fd_core::JobResult { stdout, summary, usage });
                    row.resume_payload = None;
                })?;
                self.store.transition_job(&job.id, JobStatus::Completed, self.clock.epoch_ms())?;
                self.router.record_outcome(&route.provider_id, true, None, now);
                self.release_lifecycle(job);
                self.emit_status(job, JobStatus::Completed, None);
                tracing::info!(job_id = %job.id, "job completed");
                Ok(())
            }
            ExecStatus::TimedOut => {
                self.router.record_outcome(
                    &route.provider_id,
                    false,
                    Some(ErrorClass::Timeout),
                    now,
                );
                self.release_lifecycle(job);
                self.fail_terminal(job, JobStatus::TimedOut, "backend reported timeout")
            }
            ExecStatus::Failed | ExecStatus::Cancelled => {
                let result = handle.result().await;
                let error = result.error.unwrap_or_else(|| {
                    TaskError::new(ErrorClass::Unknown, format!("backend {status}"))
                });
                self.router.record_outcome(&route.provider_id, false, Some(error.class), now);
                self.release_lifecycle(job);
                self.handle_failure(job, &error)
            }
        }
    }

    fn build_task(&self, job: &Job) -> TaskSpec {
        let conversation_history = match &job.payload {
            JobPayload::ChatResponse { conversation_history, .. } => conversation_history.clone(),
            JobPayload::Task { .. } => Vec::new(),
        };
        TaskSpec {
            job_id: job.id,
            agent_id: job.agent_id,
            session_id: job.session_id,
            prompt: job.payload.prompt().to_string(),
            goal_type: job.payload.goal_type().to_string(),
            conversation_history,
            resume: job.checkpoint.clone(),
            resume_payload: job.resume_payload.clone(),
            timeout_ms: job.timeout_ms,
            env: Vec::new(),
        }
    }

    /// Append to the session buffer, then fan the event out to subscribers.
    /// Append failures (disk full included) abort the drive as transient.
    fn append_and_broadcast(
        &self,
        buffer: &mut SessionBuffer,
        job: &Job,
        kind: SessionEventKind,
        data: serde_json::Value,
    ) -> Result<(), BufferError> {
        let event = SessionEvent::new(
            job.id,
            job.session_id,
            job.agent_id,
            kind,
            self.clock.epoch_ms(),
            data,
        );
        let written = buffer.append(event)?;
        self.streams.broadcast(
            &job.agent_id,
            &format!("buffer:{kind}"),
            &json!({
                "sequence": written.sequence,
                "data": written.data,
            }),
        );
        Ok(())
    }

    fn release_lifecycle(&self, job: &Job) {
        if let Err(err) = self.lifecycle.release(&job.agent_id) {
            tracing::debug!(agent_id = %job.agent_id, error = %err, "lifecycle release skipped");
        }
    }
}
