// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::store;
use crate::state::StoreError;
use fd_core::{Job, JobPriority, JobStatus};

#[test]
fn insert_and_prefix_lookup() {
    let store = store();
    store.insert_job(Job::builder().id("job-abc123".into()).build());

    assert!(store.get_job("job-abc123").is_some());
    assert!(store.get_job("job-abc").is_some());
    assert!(store.get_job("job-zzz").is_none());
}

#[test]
fn claim_takes_due_scheduled_job_and_consumes_attempt() {
    let store = store();
    store.insert_job(
        Job::builder().id("job-a".into()).status(JobStatus::Scheduled).run_at_ms(100).build(),
    );

    assert!(store.claim_due_job(50).is_none(), "not due yet");

    let claimed = store.claim_due_job(100).unwrap();
    assert_eq!(claimed.status, JobStatus::Running);
    assert_eq!(claimed.attempt, 1);

    // The row is now Running and cannot be claimed again
    assert!(store.claim_due_job(200).is_none());
}

#[test]
fn claim_prefers_higher_priority_then_older() {
    let store = store();
    store.insert_job(
        Job::builder()
            .id("job-old-low".into())
            .status(JobStatus::Scheduled)
            .priority(JobPriority::Low)
            .created_at_ms(1)
            .build(),
    );
    store.insert_job(
        Job::builder()
            .id("job-new-high".into())
            .status(JobStatus::Scheduled)
            .priority(JobPriority::High)
            .created_at_ms(10)
            .build(),
    );
    store.insert_job(
        Job::builder()
            .id("job-old-high".into())
            .status(JobStatus::Scheduled)
            .priority(JobPriority::High)
            .created_at_ms(5)
            .build(),
    );

    let first = store.claim_due_job(100).unwrap();
    assert_eq!(first.id, "job-old-high");
    let second = store.claim_due_job(100).unwrap();
    assert_eq!(second.id, "job-new-high");
    let third = store.claim_due_job(100).unwrap();
    assert_eq!(third.id, "job-old-low");
}

#[test]
fn claim_admits_retrying_rows() {
    let store = store();
    store.insert_job(
        Job::builder()
            .id("job-r".into())
            .status(JobStatus::Retrying)
            .attempt(1)
            .run_at_ms(0)
            .build(),
    );

    let claimed = store.claim_due_job(1).unwrap();
    assert_eq!(claimed.status, JobStatus::Running);
    assert_eq!(claimed.attempt, 2);
}

#[test]
fn transition_enforces_status_graph() {
    let store = store();
    let job = Job::builder().id("job-t".into()).status(JobStatus::Running).build();
    let id = job.id;
    store.insert_job(job);

    store.transition_job(&id, JobStatus::Completed, 10).unwrap();

    // Terminal is final
    let err = store.transition_job(&id, JobStatus::Scheduled, 20).unwrap_err();
    assert!(matches!(err, StoreError::InvalidTransition(..)));
}

#[test]
fn transition_unknown_job_fails() {
    let store = store();
    let err = store
        .transition_job(&"job-missing".into(), JobStatus::Scheduled, 0)
        .unwrap_err();
    assert!(matches!(err, StoreError::JobNotFound(_)));
}

#[test]
fn list_jobs_filters_by_status_and_agent() {
    let store = store();
    store.insert_job(
        Job::builder().id("job-1".into()).status(JobStatus::Completed).created_at_ms(1).build(),
    );
    store.insert_job(
        Job::builder()
            .id("job-2".into())
            .agent_id("agt-other".into())
            .status(JobStatus::Scheduled)
            .created_at_ms(2)
            .build(),
    );

    assert_eq!(store.list_jobs(Some(JobStatus::Completed), None).len(), 1);
    assert_eq!(store.list_jobs(None, Some("agt-other")).len(), 1);
    assert_eq!(store.list_jobs(None, None).len(), 2);
    assert_eq!(store.active_job_count(), 1);
}
