// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP surface: router assembly and bearer-token roles.

mod agents;
mod approvals;
mod error;
mod sessions;
mod status;

pub use error::ApiError;

use crate::state::AppContext;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Assemble the API router.
pub fn router(context: Arc<AppContext>) -> Router {
    Router::new()
        .route("/status", get(status::get_status))
        .route("/jobs/:job_id/approval", post(approvals::create))
        .route("/approvals", get(approvals::list))
        .route("/approvals/stream", get(approvals::stream))
        .route("/approvals/token/decide", post(approvals::decide_by_token))
        .route("/approvals/:id", get(approvals::detail))
        .route("/approvals/:id/decide", post(approvals::decide_by_id))
        .route("/approvals/:id/audit", get(approvals::audit))
        .route("/agents/:agent_id/steer", post(agents::steer))
        .route("/agents/:agent_id/stream", get(agents::stream))
        .route("/agents/:agent_id/sessions", get(agents::sessions))
        .route("/sessions/:id/messages", get(sessions::messages))
        .route("/sessions/:id", delete(sessions::end))
        .layer(CorsLayer::permissive())
        .with_state(context)
}

/// Role attached to a bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role {
    /// Read access: lists, details, streams.
    Observer,
    /// May decide approvals.
    Approver,
    /// Full control: creates approvals, steers agents, ends sessions.
    Operator,
}

/// Authenticated caller, extracted from `Authorization: Bearer`.
///
/// With no tokens configured the daemon runs open (development mode) and
/// every caller is an operator — mirroring the optional auth-token
/// handshake of the IPC listener this surface replaces.
pub struct Caller {
    pub role: Role,
}

impl Caller {
    pub fn require(&self, role: Role) -> Result<(), ApiError> {
        if self.role >= role {
            Ok(())
        } else {
            Err(ApiError::forbidden())
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppContext>> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        context: &Arc<AppContext>,
    ) -> Result<Self, Self::Rejection> {
        let auth = &context.config.auth;
        if auth.operator_tokens.is_empty() && auth.approver_tokens.is_empty() {
            return Ok(Caller { role: Role::Operator });
        }

        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(ApiError::unauthenticated)?;

        if auth.operator_tokens.iter().any(|t| t == token) {
            Ok(Caller { role: Role::Operator })
        } else if auth.approver_tokens.iter().any(|t| t == token) {
            Ok(Caller { role: Role::Approver })
        } else {
            Err(ApiError::unauthenticated())
        }
    }
}

/// Client identity forwarded into audit entries.
pub struct ClientMeta {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ClientMeta {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Ok(ClientMeta {
            ip: header("x-forwarded-for"),
            user_agent: header("user-agent"),
        })
    }
}

/// Wrap a stream subscription as an SSE response.
pub(crate) fn sse_response(
    subscription: fd_engine::StreamSubscription,
) -> axum::response::Response {
    use fd_engine::stream::frame;

    let stream = futures_util::stream::unfold(subscription, |mut subscription| async move {
        subscription
            .next_frame()
            .await
            .map(|frame| (Ok::<_, std::convert::Infallible>(frame), subscription))
    });

    axum::response::Response::builder()
        .header(axum::http::header::CONTENT_TYPE, frame::CONTENT_TYPE)
        .header(axum::http::header::CACHE_CONTROL, frame::CACHE_CONTROL)
        .header("x-accel-buffering", frame::X_ACCEL_BUFFERING)
        .body(axum::body::Body::from_stream(stream))
        .unwrap_or_else(|_| axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
