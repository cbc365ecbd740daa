// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session endpoints.

use super::{ApiError, Caller, Role};
use crate::state::AppContext;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use fd_core::SessionStatus;
use fd_wire::MessageBody;
use std::sync::Arc;

/// `GET /sessions/:id/messages` — full transcript in chronological order.
pub async fn messages(
    State(context): State<Arc<AppContext>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Vec<MessageBody>>, ApiError> {
    caller.require(Role::Observer)?;
    let session =
        context.store.get_session(&id).ok_or_else(|| ApiError::not_found("session"))?;
    let messages = context.store.messages_for(session.id.as_str());
    Ok(Json(messages.iter().map(MessageBody::from).collect()))
}

/// `DELETE /sessions/:id` — end a session. `410` when already ended.
pub async fn end(
    State(context): State<Arc<AppContext>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    caller.require(Role::Operator)?;
    let session =
        context.store.get_session(&id).ok_or_else(|| ApiError::not_found("session"))?;
    if session.status == SessionStatus::Ended {
        return Err(ApiError::new(StatusCode::GONE, "session_ended"));
    }
    context.store.end_session(&session.id)?;
    Ok(StatusCode::OK)
}
