// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent endpoints: steering, streams, session listings.

use super::{sse_response, ApiError, Caller, Role};
use crate::state::AppContext;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::Json;
use fd_core::AgentId;
use fd_wire::{SessionSummary, SteerAccepted, SteerBody};
use std::sync::Arc;

/// `POST /agents/:agent_id/steer` — operator role, `202` on acceptance.
pub async fn steer(
    State(context): State<Arc<AppContext>>,
    caller: Caller,
    Path(agent_id): Path<String>,
    Json(body): Json<SteerBody>,
) -> Result<(StatusCode, Json<SteerAccepted>), ApiError> {
    caller.require(Role::Operator)?;

    let agent_id = AgentId::from_string(&agent_id);
    let priority = body.priority.unwrap_or_else(|| "normal".to_string());
    let steer_id = context.lifecycle.steer(&agent_id, &body.message, &priority)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SteerAccepted {
            steer_message_id: steer_id.to_string(),
            agent_id: agent_id.to_string(),
            priority,
        }),
    ))
}

/// `GET /agents/:agent_id/stream` — SSE with `Last-Event-ID` replay.
pub async fn stream(
    State(context): State<Arc<AppContext>>,
    caller: Caller,
    Path(agent_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    caller.require(Role::Observer)?;
    let last_event_id = headers
        .get("last-event-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let subscription = context
        .streams
        .connect(&AgentId::from_string(&agent_id), last_event_id.as_deref());
    Ok(sse_response(subscription))
}

/// `GET /agents/:agent_id/sessions`.
pub async fn sessions(
    State(context): State<Arc<AppContext>>,
    caller: Caller,
    Path(agent_id): Path<String>,
) -> Result<Json<Vec<SessionSummary>>, ApiError> {
    caller.require(Role::Observer)?;
    let agent =
        context.store.get_agent(&agent_id).ok_or_else(|| ApiError::not_found("agent"))?;
    let sessions = context.store.sessions_for_agent(agent.id.as_str());
    Ok(Json(sessions.iter().map(SessionSummary::from).collect()))
}
