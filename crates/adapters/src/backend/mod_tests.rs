// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fd_core::{AgentId, ExecStatus, JobId, OutputEvent, SessionId, TaskSpec};

fn task(prompt: &str) -> TaskSpec {
    TaskSpec {
        job_id: JobId::from_string("job-1"),
        agent_id: AgentId::from_string("agt-1"),
        session_id: SessionId::from_string("ses-1"),
        prompt: prompt.to_string(),
        goal_type: "research".to_string(),
        conversation_history: Vec::new(),
        resume: None,
        resume_payload: None,
        timeout_ms: 120_000,
        env: Vec::new(),
    }
}

#[tokio::test]
async fn echo_backend_streams_text_then_complete() {
    let backend = EchoBackend::new();
    let mut handle = backend.execute_task(task("hello")).await.unwrap();

    let first = handle.next_event().await.unwrap();
    assert!(matches!(first, OutputEvent::Text { ref content } if content == "echo: hello"));

    let mut last = first;
    while let Some(event) = handle.next_event().await {
        last = event;
    }
    assert!(matches!(last, OutputEvent::Complete { status: ExecStatus::Completed, .. }));

    let result = handle.result().await;
    assert_eq!(result.status, ExecStatus::Completed);
    assert_eq!(result.stdout.as_deref(), Some("echo: hello"));
}

#[tokio::test]
async fn echo_backend_cancel_terminates_stream() {
    let backend = EchoBackend::new();
    let mut handle = backend.execute_task(task("hello")).await.unwrap();
    handle.cancel("shutting down");

    assert!(handle.next_event().await.is_none());
    assert_eq!(handle.result().await.status, ExecStatus::Cancelled);
}

#[tokio::test]
async fn scripted_backend_plays_scripts_in_order() {
    let backend = ScriptedBackend::new();
    backend.push_reply("first");
    backend.push_reply("second");

    let mut handle = backend.execute_task(task("a")).await.unwrap();
    let mut texts = Vec::new();
    while let Some(event) = handle.next_event().await {
        if let OutputEvent::Text { content } = event {
            texts.push(content);
        }
    }
    assert_eq!(texts, vec!["first"]);

    let mut handle = backend.execute_task(task("b")).await.unwrap();
    let mut texts = Vec::new();
    while let Some(event) = handle.next_event().await {
        if let OutputEvent::Text { content } = event {
            texts.push(content);
        }
    }
    assert_eq!(texts, vec!["second"]);

    let executed = backend.executed();
    assert_eq!(executed.len(), 2);
    assert_eq!(executed[0].prompt, "a");
}

#[tokio::test]
async fn scripted_backend_failure_is_classified() {
    let backend = ScriptedBackend::new();
    backend.push_failure(fd_core::TaskError::from_message("ECONNRESET"));

    let err = backend.execute_task(task("x")).await.err().unwrap();
    assert_eq!(err.class, fd_core::ErrorClass::Transient);
}

#[tokio::test]
async fn scripted_backend_records_steering() {
    let backend = ScriptedBackend::new();
    backend.push_reply("ok");
    let mut handle = backend.execute_task(task("x")).await.unwrap();
    handle.steer("focus on tests");
    assert_eq!(backend.steered(), vec!["focus on tests"]);
}

#[tokio::test]
async fn hang_script_parks_until_timeout() {
    let backend = ScriptedBackend::new();
    backend.push_hang();
    let mut handle = backend.execute_task(task("x")).await.unwrap();

    let waited =
        tokio::time::timeout(std::time::Duration::from_millis(20), handle.next_event()).await;
    assert!(waited.is_err(), "hang script must not yield");

    handle.cancel("timeout");
    assert!(handle.next_event().await.is_none());
    assert_eq!(handle.result().await.status, ExecStatus::Cancelled);
}
