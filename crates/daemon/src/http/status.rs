// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon status endpoint.

use super::{ApiError, Caller, Role};
use crate::state::AppContext;
use axum::extract::State;
use axum::Json;
use fd_wire::{AgentStateBody, BreakerBody, StatusBody};
use std::sync::Arc;
use std::time::Instant;

/// `GET /status`.
pub async fn get_status(
    State(context): State<Arc<AppContext>>,
    caller: Caller,
) -> Result<Json<StatusBody>, ApiError> {
    caller.require(Role::Observer)?;

    let agents = context
        .lifecycle
        .snapshot()
        .into_iter()
        .map(|(agent_id, state)| AgentStateBody { agent_id, state: state.to_string() })
        .collect();

    let breakers = context
        .router
        .snapshots(Instant::now())
        .into_iter()
        .map(|(provider_id, snapshot)| BreakerBody {
            provider_id: provider_id.to_string(),
            state: snapshot.state.to_string(),
            consecutive_failures: snapshot.consecutive_failures,
        })
        .collect();

    Ok(Json(StatusBody {
        uptime_secs: context.started_at.elapsed().as_secs(),
        jobs_active: context.store.active_job_count(),
        agents,
        breakers,
    }))
}
