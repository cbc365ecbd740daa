// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provider failover and recovery through the breaker.

use super::harness::plane;
use fd_core::{Event, Job, JobStatus, TaskError};

/// One-shot jobs keep the queue clean: a failed attempt dead-letters
/// instead of lingering as a retry that would swallow later scripts.
fn schedule(plane: &super::harness::Plane) -> fd_core::JobId {
    let job = Job::builder().status(JobStatus::Scheduled).max_attempts(1).build();
    let id = job.id;
    plane.store.insert_job(job);
    id
}

#[tokio::test]
async fn three_failures_shift_traffic_to_the_fallback() {
    let plane = plane();
    let mut bus_rx = plane.bus.subscribe();

    // Three consecutive transient failures on p1 trip its breaker
    for _ in 0..3 {
        plane.primary.push_failure(TaskError::from_message("ECONNRESET"));
        let job_id = schedule(&plane);
        plane.scheduler.drain_due().await;
        let job = plane.store.get_job(job_id.as_str()).unwrap();
        assert_eq!(job.status, JobStatus::DeadLetter);
    }
    assert_eq!(plane.primary.executed().len(), 3);

    // The next job fails over to p2
    plane.secondary.push_reply("served by p2");
    let job_id = schedule(&plane);
    plane.scheduler.drain_due().await;

    let job = plane.store.get_job(job_id.as_str()).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.result.unwrap().stdout.as_deref(), Some("served by p2"));
    assert_eq!(plane.primary.executed().len(), 3, "open breaker admits nothing");
    assert_eq!(plane.secondary.executed().len(), 1);

    let mut saw_failover = false;
    let mut saw_skipped = false;
    while let Ok(event) = bus_rx.try_recv() {
        match event {
            Event::RouteFailover { .. } => saw_failover = true,
            Event::RouteSkipped { .. } => saw_skipped = true,
            _ => {}
        }
    }
    assert!(saw_skipped, "route:skipped published");
    assert!(saw_failover, "route:failover published");
}

#[tokio::test]
async fn successful_probes_restore_the_primary() {
    let plane = plane();

    for _ in 0..3 {
        plane.primary.push_failure(TaskError::from_message("ECONNRESET"));
        schedule(&plane);
        plane.scheduler.drain_due().await;
    }
    // p1 open: traffic goes to p2
    plane.secondary.push_reply("fallback");
    schedule(&plane);
    plane.scheduler.drain_due().await;
    assert_eq!(plane.secondary.executed().len(), 1);

    // After the open window, two successful probes close p1
    plane.clock.advance(super::harness::test_breaker().open_duration);
    for _ in 0..2 {
        plane.primary.push_reply("probe ok");
        let job_id = schedule(&plane);
        plane.scheduler.drain_due().await;
        assert_eq!(
            plane.store.get_job(job_id.as_str()).unwrap().status,
            JobStatus::Completed
        );
    }

    // Primary serves again
    plane.primary.push_reply("back on p1");
    let job_id = schedule(&plane);
    plane.scheduler.drain_due().await;
    let job = plane.store.get_job(job_id.as_str()).unwrap();
    assert_eq!(job.result.unwrap().stdout.as_deref(), Some("back on p1"));
    assert_eq!(plane.secondary.executed().len(), 1, "no further fallback traffic");
}
