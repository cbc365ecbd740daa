// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background sweepers: approval expiry and lifecycle housekeeping.

use fd_core::Clock;
use fd_engine::{ApprovalGate, LifecycleManager};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub async fn run_sweepers<C: Clock>(
    gate: Arc<ApprovalGate<C>>,
    lifecycle: Arc<LifecycleManager<C>>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }
        let expired = gate.expire_due();
        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "approvals expired");
        }
        lifecycle.tick();
    }
}
