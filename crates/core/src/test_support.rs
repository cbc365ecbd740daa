// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for tests in this crate and downstream crates.
//!
//! Available to other crates via the `test-support` feature.

use crate::agent::AgentId;
use crate::job::{Job, JobConfig, JobPayload};
use crate::session::SessionId;
use crate::clock::Clock;
use crate::FakeClock;

/// A chat-response job with deterministic ids, ready to enqueue.
pub fn chat_job(prompt: &str) -> Job {
    let clock = FakeClock::new();
    Job::new(
        JobConfig::new(
            AgentId::from_string("agt-test1"),
            SessionId::from_string("ses-test1"),
            JobPayload::ChatResponse {
                prompt: prompt.to_string(),
                goal_type: "research".to_string(),
                conversation_history: Vec::new(),
            },
        ),
        &clock,
    )
}

/// A fake clock pinned to a fixed epoch for reproducible timestamps.
pub fn pinned_clock(epoch_ms: u64) -> FakeClock {
    let clock = FakeClock::new();
    clock.set_epoch_ms(epoch_ms);
    clock
}

/// Advance a fake clock by whole seconds.
pub fn advance_secs(clock: &FakeClock, secs: u64) {
    clock.advance(std::time::Duration::from_secs(secs));
    debug_assert!(clock.epoch_ms() > 0);
}
