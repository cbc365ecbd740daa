// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Approval endpoints.

use super::{sse_response, ApiError, Caller, ClientMeta, Role};
use crate::bridge::APPROVAL_STREAM_KEY;
use crate::state::AppContext;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::Json;
use fd_core::{AgentId, ApprovalStatus};
use fd_engine::{CreateApproval, DecideApproval, DecideBy};
use fd_wire::{
    ApprovalCreated, ApprovalDetail, ApprovalSummary, AuditEntryBody, CreateApprovalBody,
    DecideBody, DecideTokenBody,
};
use serde::Deserialize;
use std::sync::Arc;

/// `POST /jobs/:job_id/approval` — operator role.
pub async fn create(
    State(context): State<Arc<AppContext>>,
    caller: Caller,
    Path(job_id): Path<String>,
    Json(body): Json<CreateApprovalBody>,
) -> Result<(StatusCode, Json<ApprovalCreated>), ApiError> {
    caller.require(Role::Operator)?;

    let job = context.store.get_job(&job_id).ok_or_else(|| ApiError::not_found("job"))?;
    let created = context.gate.create_request(CreateApproval {
        job_id: job.id,
        agent_id: job.agent_id,
        action_type: body.action_type,
        action_summary: body.action_summary,
        action_detail: body.action_detail,
        ttl_seconds: body.ttl_seconds,
        risk_level: body.risk_level,
        resume_payload: body.resume_payload,
        requested_by: "operator".to_string(),
    })?;

    Ok((
        StatusCode::CREATED,
        Json(ApprovalCreated {
            detail: ApprovalDetail::from(&created.request),
            token: created.token,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status: Option<ApprovalStatus>,
}

/// `GET /approvals`.
pub async fn list(
    State(context): State<Arc<AppContext>>,
    caller: Caller,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ApprovalSummary>>, ApiError> {
    caller.require(Role::Observer)?;
    let approvals = context.store.list_approvals(query.status);
    Ok(Json(approvals.iter().map(ApprovalSummary::from).collect()))
}

/// `GET /approvals/:id`.
pub async fn detail(
    State(context): State<Arc<AppContext>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<ApprovalDetail>, ApiError> {
    caller.require(Role::Observer)?;
    let approval =
        context.store.get_approval(&id).ok_or_else(|| ApiError::not_found("approval"))?;
    Ok(Json(ApprovalDetail::from(&approval)))
}

/// `GET /approvals/:id/audit`.
pub async fn audit(
    State(context): State<Arc<AppContext>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Vec<AuditEntryBody>>, ApiError> {
    caller.require(Role::Observer)?;
    let approval =
        context.store.get_approval(&id).ok_or_else(|| ApiError::not_found("approval"))?;
    let trail = context.store.audit_for(approval.id.as_str());
    Ok(Json(trail.iter().map(AuditEntryBody::from).collect()))
}

/// `POST /approvals/:id/decide` — approver role.
pub async fn decide_by_id(
    State(context): State<Arc<AppContext>>,
    caller: Caller,
    meta: ClientMeta,
    Path(id): Path<String>,
    Json(body): Json<DecideBody>,
) -> Result<Json<ApprovalDetail>, ApiError> {
    caller.require(Role::Approver)?;
    let decided = context.gate.decide(DecideApproval {
        selector: DecideBy::Id(id),
        decision: body.decision,
        decided_by: "approver".to_string(),
        channel: "api".to_string(),
        reason: body.reason,
        ip: meta.ip,
        user_agent: meta.user_agent,
    })?;
    Ok(Json(ApprovalDetail::from(&decided)))
}

/// `POST /approvals/token/decide` — approver role, token identifies the
/// request.
pub async fn decide_by_token(
    State(context): State<Arc<AppContext>>,
    caller: Caller,
    meta: ClientMeta,
    Json(body): Json<DecideTokenBody>,
) -> Result<Json<ApprovalDetail>, ApiError> {
    caller.require(Role::Approver)?;
    let decided = context.gate.decide(DecideApproval {
        selector: DecideBy::Token(body.token),
        decision: body.decision,
        decided_by: "approver".to_string(),
        channel: "api".to_string(),
        reason: body.reason,
        ip: meta.ip,
        user_agent: meta.user_agent,
    })?;
    Ok(Json(ApprovalDetail::from(&decided)))
}

/// `GET /approvals/stream` — SSE over all approval events.
pub async fn stream(
    State(context): State<Arc<AppContext>>,
    caller: Caller,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    caller.require(Role::Observer)?;
    let last_event_id = headers
        .get("last-event-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let subscription = context
        .streams
        .connect(&AgentId::from_string(APPROVAL_STREAM_KEY), last_event_id.as_deref());
    Ok(sse_response(subscription))
}
