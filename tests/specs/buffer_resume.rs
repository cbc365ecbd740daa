// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint recovery after a torn write.

use fd_core::{AgentId, JobId, SessionEvent, SessionEventKind, SessionId};
use fd_storage::SessionBuffer;
use serde_json::json;
use std::io::Write;

fn event(kind: SessionEventKind, data: serde_json::Value) -> SessionEvent {
    SessionEvent::new(
        JobId::from_string("job-s6"),
        SessionId::from_string("ses-s6"),
        AgentId::from_string("agt-s6"),
        kind,
        1_000,
        data,
    )
}

#[test]
fn recovery_returns_checkpoint_and_events_since_it() {
    let dir = tempfile::tempdir().unwrap();
    let job_id = JobId::from_string("job-s6");

    let mut buffer = SessionBuffer::open(dir.path(), job_id).unwrap();
    buffer.append(event(SessionEventKind::SessionStart, json!({}))).unwrap();
    buffer.append(event(SessionEventKind::LlmRequest, json!({"turn": 1}))).unwrap();
    buffer.append(event(SessionEventKind::Checkpoint, json!({"step": 1}))).unwrap();
    buffer.append(event(SessionEventKind::ToolCall, json!({"name": "search"}))).unwrap();
    let path = buffer.session_file().to_path_buf();
    drop(buffer);

    // Process killed mid-way through writing a TOOL_RESULT line
    let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(b"{\"version\":1,\"job_id\":\"job-s6\",\"type\":\"TOOL_RES").unwrap();
    drop(file);

    let recovered = SessionBuffer::recover(dir.path(), &job_id).unwrap();
    assert_eq!(recovered.last_checkpoint.unwrap().data, json!({"step": 1}));
    assert_eq!(recovered.events_since_checkpoint.len(), 1);
    assert_eq!(recovered.events_since_checkpoint[0].kind, SessionEventKind::ToolCall);
    assert_eq!(recovered.session_file.unwrap(), path);
}

#[test]
fn each_resume_opens_a_new_session_file() {
    let dir = tempfile::tempdir().unwrap();
    let job_id = JobId::from_string("job-s6");

    for run in 1..=3u32 {
        let mut buffer = SessionBuffer::open(dir.path(), job_id).unwrap();
        buffer
            .append(event(SessionEventKind::SessionStart, json!({ "run": run })))
            .unwrap();
    }

    let recovered = SessionBuffer::recover(dir.path(), &job_id).unwrap();
    assert_eq!(recovered.events_since_checkpoint.len(), 1);
    assert_eq!(recovered.events_since_checkpoint[0].data, json!({"run": 3}));
    assert!(recovered.session_file.unwrap().ends_with("session-003.jsonl"));
}
