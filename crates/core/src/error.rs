// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Boundary error classification.
//!
//! Every failure crossing a provider or transport boundary is classified
//! once, at the boundary, and the category drives retry and circuit-breaker
//! treatment everywhere downstream.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category assigned to a boundary failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorClass {
    /// Caller's problem. Never retried, never trips a breaker.
    Permanent,
    /// Connection-level flakiness. Retried with backoff.
    Transient,
    /// Deadline expired somewhere along the path.
    Timeout,
    /// Provider or host out of capacity.
    Resource,
    /// Unclassifiable. Retried conservatively.
    Unknown,
}

crate::simple_display! {
    ErrorClass {
        Permanent => "permanent",
        Transient => "transient",
        Timeout => "timeout",
        Resource => "resource",
        Unknown => "unknown",
    }
}

impl ErrorClass {
    /// Whether the scheduler should retry a failure of this class.
    pub fn is_retryable(self) -> bool {
        !matches!(self, ErrorClass::Permanent)
    }

    /// Whether a failure of this class counts as a circuit-breaker failure.
    ///
    /// Unknown failures retry but do not trip breakers: a misclassified
    /// caller bug must not take a healthy provider out of rotation.
    pub fn counts_toward_breaker(self) -> bool {
        matches!(self, ErrorClass::Transient | ErrorClass::Timeout | ErrorClass::Resource)
    }

    /// Classify an HTTP status code.
    pub fn from_status(status: u16) -> ErrorClass {
        match status {
            408 | 504 => ErrorClass::Timeout,
            429 => ErrorClass::Resource,
            400..=499 => ErrorClass::Permanent,
            500..=599 => ErrorClass::Transient,
            _ => ErrorClass::Unknown,
        }
    }

    /// Classify an error message by its markers (errno names, SDK error
    /// type names, and the word "timeout").
    pub fn from_message(message: &str) -> ErrorClass {
        let msg = message.to_ascii_lowercase();
        const PERMANENT: &[&str] =
            &["enoent", "enotfound", "authenticationerror", "badrequesterror"];
        const TRANSIENT: &[&str] = &["econnreset", "econnrefused", "apiconnectionerror"];
        const TIMEOUT: &[&str] = &["aborterror", "timeout", "timed out"];
        const RESOURCE: &[&str] = &[
            "enomem",
            "enospc",
            "no space left",
            "out of memory",
            "ratelimiterror",
            "overloadederror",
        ];

        if PERMANENT.iter().any(|m| msg.contains(m)) {
            ErrorClass::Permanent
        } else if TRANSIENT.iter().any(|m| msg.contains(m)) {
            ErrorClass::Transient
        } else if TIMEOUT.iter().any(|m| msg.contains(m)) {
            ErrorClass::Timeout
        } else if RESOURCE.iter().any(|m| msg.contains(m)) {
            ErrorClass::Resource
        } else {
            ErrorClass::Unknown
        }
    }

    /// Classify a failure given an optional HTTP status and a message.
    ///
    /// The status wins when it yields a definite class; the message is the
    /// fallback for transport-level failures that never got a response.
    pub fn classify(status: Option<u16>, message: &str) -> ErrorClass {
        match status {
            Some(code) => match ErrorClass::from_status(code) {
                ErrorClass::Unknown => ErrorClass::from_message(message),
                class => class,
            },
            None => ErrorClass::from_message(message),
        }
    }
}

/// A classified failure from a provider or transport boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct TaskError {
    pub class: ErrorClass,
    pub message: String,
}

impl TaskError {
    pub fn new(class: ErrorClass, message: impl Into<String>) -> Self {
        Self { class, message: message.into() }
    }

    /// Classify a bare message (no HTTP status available).
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self { class: ErrorClass::from_message(&message), message }
    }

    /// Classify an HTTP failure.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        Self { class: ErrorClass::classify(Some(status), &message), message }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Permanent, message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Transient, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Timeout, message)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
