// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SSE reconnect replay semantics.

use super::harness::plane;
use fd_core::AgentId;
use serde_json::json;

#[tokio::test]
async fn reconnect_with_last_event_id_sees_exactly_the_missed_events() {
    let plane = plane();
    let agent = AgentId::from_string("agt-a1");

    let mut first = plane.streams.connect(&agent, None);
    for n in 1..=5 {
        plane.streams.broadcast(&agent, "output:text", &json!({ "n": n }));
    }

    // The first connection drops after consuming event 2
    let frames = first.drain_ready();
    assert_eq!(frames.len(), 5);
    let second_id = frames[1].lines().next().unwrap().trim_start_matches("id:").to_string();
    assert_eq!(second_id, "agt-a1:2");
    drop(first);

    let mut reconnected = plane.streams.connect(&agent, Some(&second_id));
    let ids: Vec<String> = reconnected
        .drain_ready()
        .iter()
        .map(|f| f.lines().next().unwrap().trim_start_matches("id:").to_string())
        .collect();
    assert_eq!(ids, vec!["agt-a1:3", "agt-a1:4", "agt-a1:5"]);

    // No duplicates arrive afterwards
    assert!(reconnected.drain_ready().is_empty());
}
