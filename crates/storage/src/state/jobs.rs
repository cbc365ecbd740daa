// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job rows: insertion, claims, status transitions.

use super::helpers;
use super::{ControlStore, StoreError};
use fd_core::{Job, JobId, JobStatus};

impl ControlStore {
    /// Insert a new job row.
    pub fn insert_job(&self, job: Job) {
        self.inner.lock().jobs.insert(job.id.to_string(), job);
    }

    /// Get a job by ID or unique prefix.
    pub fn get_job(&self, id: &str) -> Option<Job> {
        helpers::find_by_prefix(&self.inner.lock().jobs, id).cloned()
    }

    /// List jobs, optionally filtered by status and/or agent.
    pub fn list_jobs(&self, status: Option<JobStatus>, agent_id: Option<&str>) -> Vec<Job> {
        let state = self.inner.lock();
        let mut jobs: Vec<Job> = state
            .jobs
            .values()
            .filter(|j| status.is_none_or(|s| j.status == s))
            .filter(|j| agent_id.is_none_or(|a| j.agent_id == *a))
            .cloned()
            .collect();
        jobs.sort_by_key(|j| j.created_at_ms);
        jobs
    }

    /// Number of jobs not yet in a terminal status.
    pub fn active_job_count(&self) -> usize {
        self.inner.lock().jobs.values().filter(|j| !j.is_terminal()).count()
    }

    /// Atomically claim one due job: the `UPDATE … RETURNING` analog.
    ///
    /// Picks the highest-priority claimable row with `run_at ≤ now` (oldest
    /// first within a priority), moves it to `Running`, consumes an attempt,
    /// and returns the claimed row. The claim is the caller's exclusive
    /// right to drive the job to a terminal status or release it.
    pub fn claim_due_job(&self, now_ms: u64) -> Option<Job> {
        let mut state = self.inner.lock();
        let id = state
            .jobs
            .values()
            .filter(|j| j.status.is_claimable() && j.run_at_ms <= now_ms)
            .max_by(|a, b| {
                a.priority.cmp(&b.priority).then(b.created_at_ms.cmp(&a.created_at_ms))
            })
            .map(|j| j.id.to_string())?;

        let job = state.jobs.get_mut(&id)?;
        job.status = JobStatus::Running;
        job.attempt += 1;
        job.updated_at_ms = now_ms;
        Some(job.clone())
    }

    /// Transition a job's status along the status graph.
    ///
    /// Terminal statuses are final; any attempt to leave one (or to skip an
    /// edge) fails with `InvalidTransition`.
    pub fn transition_job(
        &self,
        id: &JobId,
        next: JobStatus,
        now_ms: u64,
    ) -> Result<Job, StoreError> {
        let mut state = self.inner.lock();
        let job = state
            .jobs
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::JobNotFound(id.to_string()))?;
        if !job.status.can_transition_to(next) {
            return Err(StoreError::InvalidTransition(job.status.to_string(), next.to_string()));
        }
        job.status = next;
        job.updated_at_ms = now_ms;
        Ok(job.clone())
    }

    /// Apply an arbitrary mutation to a job row under the store lock.
    pub fn update_job(
        &self,
        id: &JobId,
        mutate: impl FnOnce(&mut Job),
    ) -> Result<Job, StoreError> {
        let mut state = self.inner.lock();
        let job = state
            .jobs
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::JobNotFound(id.to_string()))?;
        mutate(job);
        Ok(job.clone())
    }
}
