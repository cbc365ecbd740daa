// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::store;
use fd_core::{AgentId, MessageRole, UserId};

#[test]
fn find_or_create_reuses_active_session() {
    let store = store();
    let agent = AgentId::from_string("agt-1");
    let user = UserId::from_string("usr-1");

    let (first, created) = store.find_or_create_session(agent, user, Some("telegram:100"), 10);
    assert!(created);

    let (second, created) =
        store.find_or_create_session(agent, user, Some("telegram:100"), 20);
    assert!(!created);
    assert_eq!(first.id, second.id);
}

#[test]
fn distinct_channels_get_distinct_sessions() {
    let store = store();
    let agent = AgentId::from_string("agt-1");
    let user = UserId::from_string("usr-1");

    let (a, _) = store.find_or_create_session(agent, user, Some("telegram:100"), 10);
    let (b, _) = store.find_or_create_session(agent, user, Some("discord:200"), 10);
    assert_ne!(a.id, b.id);
}

#[test]
fn ended_session_is_not_reused() {
    let store = store();
    let agent = AgentId::from_string("agt-1");
    let user = UserId::from_string("usr-1");

    let (first, _) = store.find_or_create_session(agent, user, Some("telegram:100"), 10);
    store.end_session(&first.id).unwrap();

    let (second, created) =
        store.find_or_create_session(agent, user, Some("telegram:100"), 20);
    assert!(created);
    assert_ne!(first.id, second.id);
}

#[test]
fn append_message_requires_session() {
    let store = store();
    let err = store.append_message(
        &"ses-missing".into(),
        MessageRole::User,
        "hi",
        0,
    );
    assert!(err.is_err());
}

#[test]
fn messages_are_chronological() {
    let store = store();
    let (session, _) = store.find_or_create_session(
        AgentId::from_string("agt-1"),
        UserId::from_string("usr-1"),
        None,
        0,
    );
    store.append_message(&session.id, MessageRole::User, "one", 1).unwrap();
    store.append_message(&session.id, MessageRole::Assistant, "two", 2).unwrap();

    let messages = store.messages_for(session.id.as_str());
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, "one");
    assert_eq!(messages[1].content, "two");
}

#[test]
fn history_excludes_latest_and_respects_limit() {
    let store = store();
    let (session, _) = store.find_or_create_session(
        AgentId::from_string("agt-1"),
        UserId::from_string("usr-1"),
        None,
        0,
    );
    for i in 0..5 {
        store
            .append_message(&session.id, MessageRole::User, format!("m{i}"), i)
            .unwrap();
    }

    let history = store.history_excluding_latest(session.id.as_str(), 2);
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content, "m2");
    assert_eq!(history[1].content, "m3");

    let all_prior = store.history_excluding_latest(session.id.as_str(), 50);
    assert_eq!(all_prior.len(), 4);
}

#[test]
fn history_of_single_message_session_is_empty() {
    let store = store();
    let (session, _) = store.find_or_create_session(
        AgentId::from_string("agt-1"),
        UserId::from_string("usr-1"),
        None,
        0,
    );
    store.append_message(&session.id, MessageRole::User, "only", 1).unwrap();
    assert!(store.history_excluding_latest(session.id.as_str(), 50).is_empty());
}

#[test]
fn sessions_for_agent_newest_first() {
    let store = store();
    let agent = AgentId::from_string("agt-1");
    let (old, _) =
        store.find_or_create_session(agent, UserId::from_string("usr-1"), Some("a:1"), 10);
    let (new, _) =
        store.find_or_create_session(agent, UserId::from_string("usr-2"), Some("a:2"), 20);

    let sessions = store.sessions_for_agent(agent.as_str());
    assert_eq!(sessions[0].id, new.id);
    assert_eq!(sessions[1].id, old.id);
}
