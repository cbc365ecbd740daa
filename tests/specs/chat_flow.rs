// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chat → job → reply happy path.

use super::harness::{inbound, plane};
use fd_core::{AgentId, JobStatus, MessageRole};

#[tokio::test(start_paused = true)]
async fn telegram_message_round_trips_through_an_agent() {
    let plane = plane();
    plane.bindings.bind("telegram", "100", AgentId::from_string("agt-test1"));
    plane.primary.push_reply("hi there");

    // Inbound "hello" creates session, user row, and a scheduled job
    let job_id = plane.dispatcher.handle_message(inbound("hello")).await.expect("job created");
    let job = plane.store.get_job(job_id.as_str()).expect("job row");
    assert_eq!(job.status, JobStatus::Scheduled);

    let session = plane.store.get_session(job.session_id.as_str()).expect("session row");
    assert_eq!(session.channel_id.as_deref(), Some("telegram:100"));
    let messages = plane.store.messages_for(session.id.as_str());
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, MessageRole::User);
    assert_eq!(messages[0].content, "hello");

    // A worker claims the job and the backend streams the reply
    assert_eq!(plane.scheduler.drain_due().await, 1);
    let job = plane.store.get_job(job_id.as_str()).expect("job row");
    assert_eq!(job.status, JobStatus::Completed);

    // The completion watcher relays the reply to the channel
    tokio::time::sleep(std::time::Duration::from_secs(3)).await;

    let messages = plane.store.messages_for(session.id.as_str());
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role, MessageRole::Assistant);
    assert_eq!(messages[1].content, "hi there");

    let sent = plane.channel.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "100");
    assert_eq!(sent[0].1.text, "hi there");
}

#[tokio::test]
async fn unbound_chat_is_answered_with_the_fixed_string() {
    let plane = plane();
    let job = plane.dispatcher.handle_message(inbound("hello")).await;
    assert!(job.is_none());
    assert_eq!(plane.channel.sent()[0].1.text, fd_engine::NO_AGENT_REPLY);
}
