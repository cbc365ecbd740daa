// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

fn agent() -> AgentId {
    AgentId::from_string("agt-s1")
}

fn manager() -> StreamManager {
    StreamManager::new(StreamConfig {
        replay_capacity: 4,
        pending_capacity: 4,
        heartbeat_interval: Duration::from_millis(50),
    })
}

fn data_of(frame: &str) -> String {
    frame
        .lines()
        .filter_map(|l| l.strip_prefix("data:"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn broadcast_assigns_monotonic_ids() {
    let manager = manager();
    let a = manager.broadcast(&agent(), "output:text", &json!({"n": 1}));
    let b = manager.broadcast(&agent(), "output:text", &json!({"n": 2}));

    assert_eq!(a.id, "agt-s1:1");
    assert_eq!(b.id, "agt-s1:2");
    assert!(b.seq > a.seq);
}

#[test]
fn connect_replays_full_buffer_without_last_event_id() {
    let manager = manager();
    for n in 1..=3 {
        manager.broadcast(&agent(), "output:text", &json!({ "n": n }));
    }

    let mut sub = manager.connect(&agent(), None);
    let frames = sub.drain_ready();
    assert_eq!(frames.len(), 3);
    assert_eq!(data_of(&frames[0]), "{\"n\":1}");
    assert_eq!(data_of(&frames[2]), "{\"n\":3}");
}

#[test]
fn connect_with_last_event_id_replays_only_later_events() {
    let manager = manager();
    for n in 1..=5 {
        manager.broadcast(&agent(), "output:text", &json!({ "n": n }));
    }

    // Replay capacity is 4, so events 2..=5 are retained; resume after 2
    let mut sub = manager.connect(&agent(), Some("agt-s1:2"));
    let frames = sub.drain_ready();
    assert_eq!(frames.len(), 3);
    assert!(frames[0].starts_with("id:agt-s1:3\n"));
    assert!(frames[2].starts_with("id:agt-s1:5\n"));
}

#[test]
fn unknown_last_event_id_replays_entire_buffer() {
    let manager = manager();
    manager.broadcast(&agent(), "output:text", &json!({"n": 1}));
    manager.broadcast(&agent(), "output:text", &json!({"n": 2}));

    // An id evicted from (or never in) the ring falls back to full replay
    let mut sub = manager.connect(&agent(), Some("agt-s1:999"));
    assert_eq!(sub.drain_ready().len(), 2);

    let mut sub = manager.connect(&agent(), Some("garbage"));
    assert_eq!(sub.drain_ready().len(), 2);
}

#[test]
fn live_broadcasts_reach_open_connections_in_order() {
    let manager = manager();
    let mut sub = manager.connect(&agent(), None);

    manager.broadcast(&agent(), "output:text", &json!({"n": 1}));
    manager.broadcast(&agent(), "output:tool_call", &json!({"n": 2}));

    let frames = sub.drain_ready();
    assert_eq!(frames.len(), 2);
    assert!(frames[0].contains("event:output:text\n"));
    assert!(frames[1].contains("event:output:tool_call\n"));
}

#[test]
fn overflowing_connection_is_closed_and_pruned() {
    let manager = manager();
    let _sub = manager.connect(&agent(), None);
    assert_eq!(manager.connection_count(&agent()), 1);

    // pending_capacity is 4; the fifth undrained frame overflows
    for n in 0..5 {
        manager.broadcast(&agent(), "output:text", &json!({ "n": n }));
    }
    assert_eq!(manager.connection_count(&agent()), 0);
}

#[test]
fn dropped_subscriber_is_pruned_on_next_broadcast() {
    let manager = manager();
    let sub = manager.connect(&agent(), None);
    drop(sub);

    manager.broadcast(&agent(), "output:text", &json!({"n": 1}));
    assert_eq!(manager.connection_count(&agent()), 0);
}

#[test]
fn disconnect_all_clears_connections_and_replay_but_not_ids() {
    let manager = manager();
    let _sub = manager.connect(&agent(), None);
    manager.broadcast(&agent(), "output:text", &json!({"n": 1}));

    manager.disconnect_all(&agent());
    assert_eq!(manager.connection_count(&agent()), 0);

    let mut sub = manager.connect(&agent(), None);
    assert!(sub.drain_ready().is_empty(), "replay ring cleared");

    let next = manager.broadcast(&agent(), "output:text", &json!({"n": 2}));
    assert_eq!(next.seq, 2, "id counter survives disconnect_all");
}

#[test]
fn shutdown_closes_every_connection() {
    let manager = manager();
    let a = AgentId::from_string("agt-a");
    let b = AgentId::from_string("agt-b");
    let _sa = manager.connect(&a, None);
    let _sb = manager.connect(&b, None);

    manager.shutdown();
    assert_eq!(manager.connection_count(&a), 0);
    assert_eq!(manager.connection_count(&b), 0);
}

#[tokio::test(start_paused = true)]
async fn heartbeats_flow_while_stream_is_quiet() {
    let manager = manager();
    let mut sub = manager.connect(&agent(), None);

    let frame = sub.next_frame().await.unwrap();
    assert_eq!(frame, frame::HEARTBEAT);
}

#[tokio::test]
async fn closed_connection_yields_none() {
    let manager = manager();
    let mut sub = manager.connect(&agent(), None);
    manager.disconnect_all(&agent());
    assert!(sub.next_frame().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn reconnect_after_drop_sees_exactly_the_missed_events() {
    let manager = manager();
    let mut sub = manager.connect(&agent(), None);

    for n in 1..=2 {
        manager.broadcast(&agent(), "output:text", &json!({ "n": n }));
    }
    let received = sub.drain_ready();
    let last_id = received.last().unwrap().lines().next().unwrap()["id:".len()..].to_string();
    drop(sub);

    for n in 3..=5 {
        manager.broadcast(&agent(), "output:text", &json!({ "n": n }));
    }

    let mut sub = manager.connect(&agent(), Some(&last_id));
    let frames = sub.drain_ready();
    let ids: Vec<&str> = frames.iter().map(|f| f.lines().next().unwrap()).collect();
    assert_eq!(ids, vec!["id:agt-s1:3", "id:agt-s1:4", "id:agt-s1:5"]);
}
