// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash-loop cooldown progression.

use super::harness::plane;
use fd_core::AgentId;
use fd_engine::LifecycleError;
use std::time::Duration;

#[tokio::test]
async fn repeated_crashes_double_the_cooldown() {
    let plane = plane();
    let agent = AgentId::from_string("agt-test1");

    let mut reported = Vec::new();
    for _ in 0..3 {
        plane.lifecycle.boot(&agent).unwrap();
        let cooldown = plane.lifecycle.crash(&agent, "panic").unwrap();
        reported.push(cooldown.as_secs());
        plane.clock.advance(cooldown);
    }
    assert_eq!(reported, vec![60, 120, 240]);

    // A fourth crash inside the window yields 480 s
    plane.lifecycle.boot(&agent).unwrap();
    let fourth = plane.lifecycle.crash(&agent, "panic").unwrap();
    assert_eq!(fourth, Duration::from_secs(480));
}

#[tokio::test]
async fn boot_during_cooldown_is_rejected() {
    let plane = plane();
    let agent = AgentId::from_string("agt-test1");

    plane.lifecycle.boot(&agent).unwrap();
    plane.lifecycle.crash(&agent, "panic").unwrap();

    let err = plane.lifecycle.boot(&agent).unwrap_err();
    assert!(matches!(err, LifecycleError::InCooldown { .. }));

    // Mid-cooldown still rejected, post-cooldown admitted
    plane.clock.advance(Duration::from_secs(30));
    assert!(plane.lifecycle.boot(&agent).is_err());
    plane.clock.advance(Duration::from_secs(30));
    assert!(plane.lifecycle.boot(&agent).is_ok());
}
