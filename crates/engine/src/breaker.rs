// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-provider circuit breaker.
//!
//! ```text
//! ┌─────────┐  failures ≥ threshold   ┌────────┐
//! │ CLOSED  │ ──────────────────────> │  OPEN  │
//! └─────────┘                         └────────┘
//!      ^                                   │
//!      │ successes ≥ close threshold       │ open_duration elapsed
//!      │                                   v
//!      │                         ┌─────────────┐
//!      └──────────────────────── │  HALF_OPEN  │ ── any failure ──> OPEN
//!                                └─────────────┘
//! ```
//!
//! Only failures classified as transient, timeout, or resource count; a
//! permanent provider error is the caller's problem and releases the probe
//! slot without moving the state machine. State is in-memory only.

use serde::Serialize;
use std::time::{Duration, Instant};

/// Breaker tuning for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerConfig {
    /// Consecutive classified failures that open the breaker.
    pub failure_threshold: u32,
    /// How long the breaker stays open before probing.
    pub open_duration: Duration,
    /// Concurrent probes admitted while half-open.
    pub half_open_max_attempts: u32,
    /// Consecutive probe successes that close the breaker.
    pub success_threshold_to_close: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_duration: Duration::from_secs(30),
            half_open_max_attempts: 1,
            success_threshold_to_close: 2,
        }
    }
}

/// Observable breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

fd_core::simple_display! {
    BreakerState {
        Closed => "closed",
        Open => "open",
        HalfOpen => "half_open",
    }
}

/// Point-in-time view for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    pub state: BreakerState,
    pub consecutive_failures: u32,
    pub half_open_in_flight: u32,
}

#[derive(Debug)]
struct Inner {
    state: BreakerState,
    consecutive_failures: u32,
    half_open_in_flight: u32,
    half_open_successes: u32,
    opened_at: Option<Instant>,
}

/// Breaker state machine. Callers pass `now` explicitly so the clock stays
/// injectable; all transitions are atomic under one lock.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    inner: parking_lot::Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            inner: parking_lot::Mutex::new(Inner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                half_open_in_flight: 0,
                half_open_successes: 0,
                opened_at: None,
            }),
        }
    }

    /// Current state, applying the lazy open → half-open transition.
    pub fn state(&self, now: Instant) -> BreakerState {
        let mut inner = self.inner.lock();
        self.refresh(&mut inner, now);
        inner.state
    }

    /// Try to admit one call. A `true` return in half-open consumes a probe
    /// slot; every admitted call must be answered by exactly one
    /// `record_success`, `record_failure`, or `record_neutral`.
    pub fn admit(&self, now: Instant) -> bool {
        let mut inner = self.inner.lock();
        self.refresh(&mut inner, now);
        match inner.state {
            BreakerState::Closed => true,
            BreakerState::Open => false,
            BreakerState::HalfOpen => {
                if inner.half_open_in_flight < self.config.half_open_max_attempts {
                    inner.half_open_in_flight += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Record a successful call.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            BreakerState::Closed => inner.consecutive_failures = 0,
            BreakerState::HalfOpen => {
                inner.half_open_in_flight = inner.half_open_in_flight.saturating_sub(1);
                inner.half_open_successes += 1;
                if inner.half_open_successes >= self.config.success_threshold_to_close {
                    tracing::info!("circuit closed after successful probes");
                    *inner = closed();
                }
            }
            // A success landing while open (call admitted before the trip)
            // does not close the circuit early.
            BreakerState::Open => {}
        }
    }

    /// Record a breaker-countable failure.
    pub fn record_failure(&self, now: Instant) {
        let mut inner = self.inner.lock();
        match inner.state {
            BreakerState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.config.failure_threshold {
                    tracing::warn!(
                        failures = inner.consecutive_failures,
                        "circuit opened"
                    );
                    inner.state = BreakerState::Open;
                    inner.opened_at = Some(now);
                }
            }
            BreakerState::HalfOpen => {
                // Any probe failure reopens and resets the clock
                tracing::warn!("probe failed, circuit reopened");
                inner.state = BreakerState::Open;
                inner.opened_at = Some(now);
                inner.half_open_in_flight = 0;
                inner.half_open_successes = 0;
            }
            BreakerState::Open => {}
        }
    }

    /// Release an admitted slot without counting an outcome (permanent
    /// provider errors).
    pub fn record_neutral(&self) {
        let mut inner = self.inner.lock();
        if inner.state == BreakerState::HalfOpen {
            inner.half_open_in_flight = inner.half_open_in_flight.saturating_sub(1);
        }
    }

    pub fn snapshot(&self, now: Instant) -> BreakerSnapshot {
        let mut inner = self.inner.lock();
        self.refresh(&mut inner, now);
        BreakerSnapshot {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            half_open_in_flight: inner.half_open_in_flight,
        }
    }

    fn refresh(&self, inner: &mut Inner, now: Instant) {
        if inner.state == BreakerState::Open {
            let elapsed = inner.opened_at.map(|at| now.duration_since(at));
            if elapsed.is_some_and(|e| e >= self.config.open_duration) {
                inner.state = BreakerState::HalfOpen;
                inner.half_open_in_flight = 0;
                inner.half_open_successes = 0;
            }
        }
    }
}

fn closed() -> Inner {
    Inner {
        state: BreakerState::Closed,
        consecutive_failures: 0,
        half_open_in_flight: 0,
        half_open_successes: 0,
        opened_at: None,
    }
}

#[cfg(test)]
#[path = "breaker_tests.rs"]
mod tests;
