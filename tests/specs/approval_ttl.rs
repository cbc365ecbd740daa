// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Approval TTL expiry fails the waiting job.

use super::harness::plane;
use fd_core::{AgentId, ApprovalStatus, Job, JobId, JobStatus, RiskLevel};
use fd_engine::CreateApproval;
use std::time::Duration;

#[tokio::test]
async fn undecided_approval_expires_and_fails_the_job() {
    let plane = plane();
    let job = Job::builder().status(JobStatus::Running).build();
    let job_id = job.id;
    plane.store.insert_job(job);

    let created = plane
        .gate
        .create_request(CreateApproval {
            job_id,
            agent_id: AgentId::from_string("agt-test1"),
            action_type: "deploy".to_string(),
            action_summary: "push to production".to_string(),
            action_detail: serde_json::Value::Null,
            ttl_seconds: 60,
            risk_level: RiskLevel::Critical,
            resume_payload: None,
            requested_by: "operator".to_string(),
        })
        .unwrap();

    assert_eq!(
        plane.store.get_job(job_id.as_str()).unwrap().status,
        JobStatus::WaitingForApproval
    );

    // No decision arrives within the TTL
    plane.clock.advance(Duration::from_secs(61));
    let expired = plane.gate.expire_due();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].id, created.request.id);
    assert_eq!(expired[0].status, ApprovalStatus::Expired);

    let job = plane.store.get_job(job_id.as_str()).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.last_error.as_deref(), Some("approval_expired"));
}

#[tokio::test]
async fn approved_before_expiry_reschedules_the_job() {
    let plane = plane();
    let job = Job::builder().id(JobId::from_string("job-app1")).status(JobStatus::Running).build();
    let job_id = job.id;
    plane.store.insert_job(job);

    let created = plane
        .gate
        .create_request(CreateApproval {
            job_id,
            agent_id: AgentId::from_string("agt-test1"),
            action_type: "deploy".to_string(),
            action_summary: "push to production".to_string(),
            action_detail: serde_json::Value::Null,
            ttl_seconds: 60,
            risk_level: RiskLevel::High,
            resume_payload: None,
            requested_by: "operator".to_string(),
        })
        .unwrap();

    plane
        .gate
        .decide(fd_engine::DecideApproval {
            selector: fd_engine::DecideBy::Token(created.token),
            decision: ApprovalStatus::Approved,
            decided_by: "approver".to_string(),
            channel: "api".to_string(),
            reason: None,
            ip: None,
            user_agent: None,
        })
        .unwrap();

    assert_eq!(plane.store.get_job(job_id.as_str()).unwrap().status, JobStatus::Scheduled);

    // The sweeper no longer touches a decided request
    plane.clock.advance(Duration::from_secs(120));
    assert!(plane.gate.expire_due().is_empty());
}
