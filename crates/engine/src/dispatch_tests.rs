// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fd_adapters::{ChannelCallback, FakeChannelAdapter, InMemoryBindings};
use fd_core::{AgentId, FakeClock, JobResult, UserId};

struct Fixture {
    dispatcher: Arc<MessageDispatcher<FakeClock>>,
    adapter: FakeChannelAdapter,
    bindings: Arc<InMemoryBindings>,
    store: ControlStore,
    bus: EventBus,
}

fn setup() -> Fixture {
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_000_000);
    let store = ControlStore::new();
    let bindings = Arc::new(InMemoryBindings::new());
    let bus = EventBus::default();
    let dispatcher = Arc::new(MessageDispatcher::new(
        DispatchConfig::default(),
        store.clone(),
        bindings.clone(),
        bus.clone(),
        clock,
    ));
    let adapter = FakeChannelAdapter::new("telegram");
    dispatcher.attach_channel(Arc::new(adapter.clone()));
    Fixture { dispatcher, adapter, bindings, store, bus }
}

fn inbound(text: &str) -> RoutedMessage {
    RoutedMessage {
        channel_type: "telegram".to_string(),
        chat_id: "100".to_string(),
        user_account_id: UserId::from_string("usr-u1"),
        text: text.to_string(),
    }
}

#[tokio::test]
async fn unbound_chat_gets_fixed_reply() {
    let f = setup();
    let job = f.dispatcher.handle_message(inbound("hello")).await;
    assert!(job.is_none());

    let sent = f.adapter.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1.text, NO_AGENT_REPLY);
}

#[tokio::test]
async fn bound_chat_creates_session_message_and_job() {
    let f = setup();
    let agent = AgentId::from_string("agt-a1");
    f.bindings.bind("telegram", "100", agent);
    let mut bus_rx = f.bus.subscribe();

    let job_id = f.dispatcher.handle_message(inbound("hello")).await.unwrap();

    let job = f.store.get_job(job_id.as_str()).unwrap();
    assert_eq!(job.status, JobStatus::Scheduled);
    assert_eq!(job.agent_id, agent);
    assert_eq!(job.max_attempts, 3);
    assert_eq!(job.timeout_ms, 120_000);
    match &job.payload {
        JobPayload::ChatResponse { prompt, goal_type, conversation_history } => {
            assert_eq!(prompt, "hello");
            assert_eq!(goal_type, "research");
            assert!(conversation_history.is_empty(), "first message has no history");
        }
        other => panic!("unexpected payload: {other:?}"),
    }

    let session = f.store.get_session(job.session_id.as_str()).unwrap();
    assert_eq!(session.channel_id.as_deref(), Some("telegram:100"));
    let messages = f.store.messages_for(session.id.as_str());
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, MessageRole::User);

    assert!(matches!(bus_rx.try_recv(), Ok(Event::JobCreated { .. })));
}

#[tokio::test]
async fn second_message_reuses_session_and_carries_history() {
    let f = setup();
    f.bindings.bind("telegram", "100", AgentId::from_string("agt-a1"));

    let first = f.dispatcher.handle_message(inbound("first")).await.unwrap();
    let first_job = f.store.get_job(first.as_str()).unwrap();
    // Simulate the scheduler finishing the first job with a reply
    f.store
        .update_job(&first, |row| {
            row.result = Some(JobResult {
                stdout: Some("first reply".to_string()),
                summary: None,
                usage: Default::default(),
            });
        })
        .unwrap();
    f.store
        .append_message(&first_job.session_id, MessageRole::Assistant, "first reply", 2_000_000)
        .unwrap();

    let second = f.dispatcher.handle_message(inbound("second")).await.unwrap();
    let second_job = f.store.get_job(second.as_str()).unwrap();
    assert_eq!(second_job.session_id, first_job.session_id);

    match &second_job.payload {
        JobPayload::ChatResponse { conversation_history, .. } => {
            let contents: Vec<&str> =
                conversation_history.iter().map(|h| h.content.as_str()).collect();
            assert_eq!(contents, vec!["first", "first reply"]);
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn completion_is_relayed_as_assistant_message() {
    let f = setup();
    f.bindings.bind("telegram", "100", AgentId::from_string("agt-a1"));

    let job_id = f.dispatcher.handle_message(inbound("hello")).await.unwrap();
    let job = f.store.get_job(job_id.as_str()).unwrap();

    // Scheduler completes the job out of band
    f.store
        .update_job(&job_id, |row| {
            row.result = Some(JobResult {
                stdout: Some("hi there".to_string()),
                summary: None,
                usage: Default::default(),
            });
        })
        .unwrap();
    f.store.transition_job(&job_id, JobStatus::Running, 1).unwrap();
    f.store.transition_job(&job_id, JobStatus::Completed, 2).unwrap();

    // Let the 2-second poller observe it
    tokio::time::sleep(Duration::from_secs(3)).await;

    let sent = f.adapter.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "100");
    assert_eq!(sent[0].1.text, "hi there");

    let messages = f.store.messages_for(job.session_id.as_str());
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role, MessageRole::Assistant);
    assert_eq!(messages[1].content, "hi there");
}

#[tokio::test(start_paused = true)]
async fn failed_job_relays_fixed_error_string() {
    let f = setup();
    f.bindings.bind("telegram", "100", AgentId::from_string("agt-a1"));

    let job_id = f.dispatcher.handle_message(inbound("hello")).await.unwrap();
    f.store.transition_job(&job_id, JobStatus::Running, 1).unwrap();
    f.store
        .update_job(&job_id, |row| row.last_error = Some("secret internal detail".to_string()))
        .unwrap();
    f.store.transition_job(&job_id, JobStatus::Failed, 2).unwrap();

    tokio::time::sleep(Duration::from_secs(3)).await;

    let sent = f.adapter.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1.text, ERROR_REPLY);
    assert!(!sent[0].1.text.contains("secret"));
}

#[tokio::test(start_paused = true)]
async fn summary_is_the_stdout_fallback() {
    let f = setup();
    f.bindings.bind("telegram", "100", AgentId::from_string("agt-a1"));

    let job_id = f.dispatcher.handle_message(inbound("hello")).await.unwrap();
    f.store
        .update_job(&job_id, |row| {
            row.result = Some(JobResult {
                stdout: None,
                summary: Some("summarized".to_string()),
                usage: Default::default(),
            });
        })
        .unwrap();
    f.store.transition_job(&job_id, JobStatus::Running, 1).unwrap();
    f.store.transition_job(&job_id, JobStatus::Completed, 2).unwrap();

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(f.adapter.sent()[0].1.text, "summarized");
}

#[tokio::test]
async fn callbacks_do_not_panic_without_handler() {
    let f = setup();
    f.adapter.inject_callback(ChannelCallback {
        chat_id: "100".to_string(),
        user_account_id: UserId::from_string("usr-u1"),
        data: "apr-1:approve".to_string(),
    });
}
