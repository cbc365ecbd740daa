// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bus → stream bridge.
//!
//! Subscribes to the event bus and fans control-plane events out on the
//! owning agent's SSE stream. Approval events additionally land on the
//! shared approvals stream. Terminated agents get their connections closed
//! and replay cleared.

use fd_core::{AgentId, AgentState, Event};
use fd_engine::{EventBus, StreamManager};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Pseudo-agent key carrying all approval events for `GET /approvals/stream`.
pub const APPROVAL_STREAM_KEY: &str = "approvals";

pub async fn run_event_bridge(
    bus: EventBus,
    streams: Arc<StreamManager>,
    cancel: CancellationToken,
) {
    let mut rx = bus.subscribe();
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => return,
            event = rx.recv() => event,
        };
        match event {
            Ok(event) => forward(&streams, &event),
            Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                tracing::warn!(missed, "event bridge lagged, streams rely on replay");
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => return,
        }
    }
}

fn forward(streams: &StreamManager, event: &Event) {
    let payload = match serde_json::to_value(event) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::error!(error = %err, "event not serializable");
            return;
        }
    };

    if let Some(agent_id) = event.agent_id() {
        streams.broadcast(agent_id, event.name(), &payload);
        if let Event::AgentState { to: AgentState::Terminated, .. } = event {
            streams.disconnect_all(agent_id);
        }
    }
    if event.is_approval_event() {
        streams.broadcast(&AgentId::from_string(APPROVAL_STREAM_KEY), event.name(), &payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fd_core::{ApprovalId, JobId};

    #[tokio::test]
    async fn forwards_agent_events_and_mirrors_approvals() {
        let bus = EventBus::default();
        let streams = Arc::new(StreamManager::default());
        let cancel = CancellationToken::new();
        let bridge =
            tokio::spawn(run_event_bridge(bus.clone(), streams.clone(), cancel.clone()));

        let agent = AgentId::from_string("agt-b1");
        let mut agent_sub = streams.connect(&agent, None);
        let mut approvals_sub =
            streams.connect(&AgentId::from_string(APPROVAL_STREAM_KEY), None);

        bus.emit(Event::ApprovalRequested {
            approval_id: ApprovalId::from_string("apr-1"),
            job_id: JobId::from_string("job-1"),
            agent_id: agent,
            risk_level: fd_core::RiskLevel::High,
            action_summary: "do the thing".to_string(),
        });

        // Give the bridge task a turn
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        let frame = agent_sub.next_frame().await.unwrap();
        assert!(frame.contains("event:approval:requested\n"));
        let frame = approvals_sub.next_frame().await.unwrap();
        assert!(frame.contains("event:approval:requested\n"));

        cancel.cancel();
        bridge.await.unwrap();
    }

    #[tokio::test]
    async fn termination_disconnects_agent_streams() {
        let bus = EventBus::default();
        let streams = Arc::new(StreamManager::default());
        let cancel = CancellationToken::new();
        let bridge =
            tokio::spawn(run_event_bridge(bus.clone(), streams.clone(), cancel.clone()));

        let agent = AgentId::from_string("agt-b2");
        let _sub = streams.connect(&agent, None);
        assert_eq!(streams.connection_count(&agent), 1);

        bus.emit(Event::AgentState {
            agent_id: agent,
            from: AgentState::Executing,
            to: AgentState::Terminated,
            reason: Some("crash".to_string()),
        });

        // Let the bridge observe the event
        for _ in 0..10 {
            tokio::task::yield_now().await;
            if streams.connection_count(&agent) == 0 {
                break;
            }
        }
        assert_eq!(streams.connection_count(&agent), 0);

        cancel.cancel();
        bridge.await.unwrap();
    }
}
