// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry schedule with capped exponential backoff and uniform jitter.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Lower jitter bound applied to every computed delay.
pub const JITTER_MIN: f64 = 0.75;
/// Upper jitter bound applied to every computed delay.
pub const JITTER_MAX: f64 = 1.25;

/// Backoff schedule for transient job failures.
///
/// `delay = min(max_delay, base * multiplier^attempt) * jitter` with jitter
/// drawn uniformly from `[JITTER_MIN, JITTER_MAX]`. Delays are integer
/// milliseconds and strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub base_ms: u64,
    pub multiplier: f64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { base_ms: 1_000, multiplier: 2.0, max_delay_ms: 300_000 }
    }
}

impl RetryPolicy {
    /// Delay before the given retry attempt, without jitter.
    pub fn raw_delay_ms(&self, attempt: u32) -> u64 {
        let exp = self.base_ms as f64 * self.multiplier.powi(attempt.min(64) as i32);
        if exp.is_finite() {
            (exp as u64).min(self.max_delay_ms)
        } else {
            self.max_delay_ms
        }
    }

    /// Jittered delay before the given retry attempt.
    pub fn delay_ms(&self, attempt: u32, rng: &mut impl Rng) -> u64 {
        let jitter = rng.random_range(JITTER_MIN..=JITTER_MAX);
        let delay = (self.raw_delay_ms(attempt) as f64 * jitter).round() as u64;
        delay.max(1)
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
