// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP error mapping.
//!
//! Component errors map onto the API status contract: 400 schema,
//! 401 unauthenticated, 403 role, 404 missing, 409 wrong state,
//! 410 expired/terminated, 503 unavailable.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fd_engine::{ApprovalError, LifecycleError};
use fd_storage::StoreError;
use fd_wire::ErrorBody;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self { status, body: ErrorBody::new(error) }
    }

    pub fn with_message(
        status: StatusCode,
        error: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self { status, body: ErrorBody::with_message(error, message) }
    }

    pub fn not_found(what: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{what}_not_found"))
    }

    pub fn unauthenticated() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthenticated")
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "forbidden")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<ApprovalError> for ApiError {
    fn from(err: ApprovalError) -> Self {
        match err {
            ApprovalError::NotFound => Self::new(StatusCode::NOT_FOUND, "not_found"),
            ApprovalError::AlreadyDecided => Self::new(StatusCode::CONFLICT, "already_decided"),
            ApprovalError::Expired => Self::new(StatusCode::GONE, "expired"),
            ApprovalError::InvalidDecision(msg) => {
                Self::with_message(StatusCode::BAD_REQUEST, "invalid_decision", msg)
            }
            ApprovalError::Store(err) => err.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::JobNotFound(_) => Self::not_found("job"),
            StoreError::SessionNotFound(_) => Self::not_found("session"),
            StoreError::ApprovalNotFound(_) => Self::not_found("approval"),
            StoreError::AgentNotFound(_) => Self::not_found("agent"),
            StoreError::InvalidTransition(from, to) => Self::with_message(
                StatusCode::CONFLICT,
                "wrong_state",
                format!("{from} → {to}"),
            ),
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::UnknownAgent(_) => Self::not_found("agent"),
            LifecycleError::InvalidState { .. } => {
                Self::with_message(StatusCode::CONFLICT, "invalid_state", err.to_string())
            }
            LifecycleError::InCooldown { .. } => {
                Self::with_message(StatusCode::SERVICE_UNAVAILABLE, "in_cooldown", err.to_string())
            }
            LifecycleError::Busy(_) => {
                Self::with_message(StatusCode::CONFLICT, "busy", err.to_string())
            }
            LifecycleError::Hydration(msg) => {
                Self::with_message(StatusCode::SERVICE_UNAVAILABLE, "hydration_failed", msg)
            }
        }
    }
}
