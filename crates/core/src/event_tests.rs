// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn agent() -> AgentId {
    AgentId::from_string("agt-1")
}

#[test]
fn serializes_with_topic_tag() {
    let event = Event::AgentState {
        agent_id: agent(),
        from: AgentState::Ready,
        to: AgentState::Executing,
        reason: None,
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "agent:state");
    assert_eq!(json["from"], "READY");
    assert_eq!(json["to"], "EXECUTING");
}

#[test]
fn unknown_tag_deserializes_to_custom() {
    let event: Event = serde_json::from_str(r#"{"type": "weird:thing"}"#).unwrap();
    assert_eq!(event, Event::Custom);
}

#[test]
fn name_matches_serialized_tag() {
    let event = Event::RouteSkipped {
        agent_id: agent(),
        provider_id: ProviderId::new("p1"),
        reason: "circuit_open".into(),
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], event.name());
}

#[test]
fn agent_id_extraction() {
    let event = Event::JobCreated {
        job_id: JobId::from_string("job-1"),
        agent_id: agent(),
        session_id: SessionId::from_string("ses-1"),
    };
    assert_eq!(event.agent_id(), Some(&agent()));
    assert_eq!(Event::Custom.agent_id(), None);
}

#[test]
fn approval_event_filter() {
    let approval = Event::ApprovalExpired {
        approval_id: ApprovalId::from_string("apr-1"),
        job_id: JobId::from_string("job-1"),
        agent_id: agent(),
    };
    assert!(approval.is_approval_event());

    let other = Event::AgentUnhealthy { agent_id: agent(), missed_heartbeats: 3 };
    assert!(!other.is_approval_event());
}
