// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job scheduler: lease loop, retries, terminal promotions.
//!
//! Workers claim due jobs from the store (the claim is an exclusive lease),
//! drive each job through lifecycle, routing, and the backend event stream,
//! and are the only writers that move `job.status` into a terminal value.

mod execute;

use crate::approval::ApprovalGate;
use crate::bus::EventBus;
use crate::lifecycle::LifecycleManager;
use crate::router::ProviderRouter;
use crate::stream::StreamManager;
use fd_core::{Clock, Event, Job, JobStatus, RetryPolicy};
use fd_storage::{ControlStore, StoreError};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Scheduler tuning.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Concurrent worker loops.
    pub workers: usize,
    /// Idle poll cadence for the job table.
    pub poll_interval: Duration,
    pub retry: RetryPolicy,
    /// Root directory for per-job session buffers.
    pub buffer_root: PathBuf,
    /// Requeue delay when the target agent is mid-transition or busy.
    pub busy_requeue_delay: Duration,
}

impl SchedulerConfig {
    pub fn new(buffer_root: PathBuf) -> Self {
        Self {
            workers: 2,
            poll_interval: Duration::from_millis(500),
            retry: RetryPolicy::default(),
            buffer_root,
            busy_requeue_delay: Duration::from_millis(500),
        }
    }
}

/// The scheduler. Shared behind an `Arc`; workers are spawned tasks.
pub struct JobScheduler<C: Clock> {
    pub(crate) config: SchedulerConfig,
    pub(crate) store: ControlStore,
    pub(crate) router: Arc<ProviderRouter>,
    pub(crate) lifecycle: Arc<LifecycleManager<C>>,
    pub(crate) streams: Arc<StreamManager>,
    pub(crate) gate: Arc<ApprovalGate<C>>,
    pub(crate) bus: EventBus,
    pub(crate) clock: C,
    cancel: CancellationToken,
}

impl<C: Clock> JobScheduler<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: SchedulerConfig,
        store: ControlStore,
        router: Arc<ProviderRouter>,
        lifecycle: Arc<LifecycleManager<C>>,
        streams: Arc<StreamManager>,
        gate: Arc<ApprovalGate<C>>,
        bus: EventBus,
        clock: C,
        cancel: CancellationToken,
    ) -> Self {
        Self { config, store, router, lifecycle, streams, gate, bus, clock, cancel }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Spawn the worker pool. Workers stop claiming when the cancellation
    /// token fires and cancel their in-flight handle with
    /// `"shutting down"`.
    pub fn spawn_workers(self: &Arc<Self>) -> Vec<tokio::task::JoinHandle<()>> {
        (0..self.config.workers.max(1))
            .map(|worker| {
                let scheduler = self.clone();
                tokio::spawn(async move {
                    tracing::debug!(worker, "scheduler worker started");
                    scheduler.worker_loop().await;
                    tracing::debug!(worker, "scheduler worker stopped");
                })
            })
            .collect()
    }

    async fn worker_loop(&self) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
            self.drain_due().await;
        }
    }

    /// Claim and drive every currently-due job. Returns how many ran.
    /// Exposed for tests and for event-driven wakeups.
    pub async fn drain_due(&self) -> usize {
        let mut driven = 0;
        while !self.cancel.is_cancelled() {
            let Some(job) = self.store.claim_due_job(self.clock.epoch_ms()) else {
                break;
            };
            driven += 1;
            self.emit_status(&job, JobStatus::Running, None);
            let job_id = job.id;
            if let Err(err) = self.drive(job).await {
                tracing::error!(job_id = %job_id, error = %err, "job drive failed");
            }
        }
        driven
    }

    pub(crate) fn emit_status(&self, job: &Job, status: JobStatus, last_error: Option<String>) {
        self.bus.emit(Event::JobStatusChanged {
            job_id: job.id,
            agent_id: job.agent_id,
            status,
            attempt: job.attempt,
            last_error,
        });
    }

    /// Move a job into a terminal status with an error note.
    pub(crate) fn fail_terminal(
        &self,
        job: &Job,
        status: JobStatus,
        error: &str,
    ) -> Result<(), StoreError> {
        let now = self.clock.epoch_ms();
        self.store.update_job(&job.id, |row| row.last_error = Some(error.to_string()))?;
        self.store.transition_job(&job.id, status, now)?;
        self.emit_status(job, status, Some(error.to_string()));
        tracing::warn!(job_id = %job.id, status = %status, error, "job terminal");
        Ok(())
    }

    /// Give a claim back without consuming the attempt (agent busy,
    /// shutdown). The row returns to `Scheduled` with a short delay.
    pub(crate) fn release_claim(&self, job: &Job, delay: Duration) -> Result<(), StoreError> {
        let now = self.clock.epoch_ms();
        self.store.update_job(&job.id, |row| {
            row.status = JobStatus::Scheduled;
            row.attempt = row.attempt.saturating_sub(1);
            row.run_at_ms = now + delay.as_millis() as u64;
            row.updated_at_ms = now;
        })?;
        tracing::debug!(job_id = %job.id, delay_ms = delay.as_millis() as u64, "claim released");
        Ok(())
    }

    /// Route a failed attempt: retry with backoff, dead-letter on
    /// exhaustion, fail immediately on permanent errors.
    pub(crate) fn handle_failure(
        &self,
        job: &Job,
        error: &fd_core::TaskError,
    ) -> Result<(), StoreError> {
        if !error.class.is_retryable() {
            return self.fail_terminal(job, JobStatus::Failed, &error.message);
        }
        if job.attempts_exhausted() {
            return self.fail_terminal(job, JobStatus::DeadLetter, &error.message);
        }

        let delay_ms = self
            .config
            .retry
            .delay_ms(job.attempt.saturating_sub(1), &mut rand::rng());
        let now = self.clock.epoch_ms();
        self.store.update_job(&job.id, |row| {
            row.last_error = Some(error.message.clone());
            row.run_at_ms = now + delay_ms;
        })?;
        self.store.transition_job(&job.id, JobStatus::Retrying, now)?;
        self.emit_status(job, JobStatus::Retrying, Some(error.message.clone()));
        tracing::info!(
            job_id = %job.id,
            attempt = job.attempt,
            delay_ms,
            class = %error.class,
            "retry scheduled"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
