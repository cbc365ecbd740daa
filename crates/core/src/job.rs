// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier and state machine.

use crate::agent::AgentId;
use crate::clock::Clock;
use crate::session::SessionId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a job instance.
    ///
    /// Each unit of work gets a unique ID used to track its status, reference
    /// it in logs and events, and address its session buffer directory.
    pub struct JobId("job-");
}

/// Status of a job.
///
/// ```text
/// PENDING → SCHEDULED → RUNNING → COMPLETED
///                │          ├──→ RETRYING → SCHEDULED
///                │          ├──→ WAITING_FOR_APPROVAL → SCHEDULED | FAILED
///                │          ├──→ FAILED
///                │          ├──→ TIMED_OUT
///                │          └──→ DEAD_LETTER
///                └← (claim also admits RETRYING directly)
/// ```
///
/// Terminal statuses are final; the scheduler is the only writer that may
/// move a job into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Scheduled,
    Running,
    Retrying,
    WaitingForApproval,
    Completed,
    Failed,
    TimedOut,
    DeadLetter,
}

crate::simple_display! {
    JobStatus {
        Pending => "pending",
        Scheduled => "scheduled",
        Running => "running",
        Retrying => "retrying",
        WaitingForApproval => "waiting_for_approval",
        Completed => "completed",
        Failed => "failed",
        TimedOut => "timed_out",
        DeadLetter => "dead_letter",
    }
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::TimedOut | JobStatus::DeadLetter
        )
    }

    /// Whether a claim may pick the job up in this status.
    pub fn is_claimable(self) -> bool {
        matches!(self, JobStatus::Scheduled | JobStatus::Retrying)
    }

    /// Whether moving from `self` to `next` follows the status graph.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        match (self, next) {
            (Pending, Scheduled) => true,
            (Scheduled | Retrying, Running) => true,
            (Running, Completed | Retrying | WaitingForApproval | Failed | TimedOut | DeadLetter) => {
                true
            }
            (Retrying, Scheduled) => true,
            (Retrying, DeadLetter) => true,
            (WaitingForApproval, Scheduled | Running | Failed) => true,
            // The claim path may also time out or dead-letter a job it could
            // not start (checkpoint corruption, wall-clock expiry).
            (Scheduled, Failed | TimedOut | DeadLetter) => true,
            _ => false,
        }
    }
}

/// Relative scheduling weight of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPriority {
    Low,
    Normal,
    High,
}

crate::simple_display! {
    JobPriority {
        Low => "low",
        Normal => "normal",
        High => "high",
    }
}

/// One prior turn handed to the backend as conversation context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: crate::session::MessageRole,
    pub content: String,
}

/// What the job asks the agent to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JobPayload {
    /// Respond to a chat message, with prior conversation turns as context.
    #[serde(rename = "CHAT_RESPONSE")]
    ChatResponse {
        prompt: String,
        goal_type: String,
        #[serde(default)]
        conversation_history: Vec<HistoryEntry>,
    },
    /// A one-shot task submitted through the API.
    #[serde(rename = "TASK")]
    Task { prompt: String, goal_type: String },
}

impl JobPayload {
    pub fn prompt(&self) -> &str {
        match self {
            JobPayload::ChatResponse { prompt, .. } | JobPayload::Task { prompt, .. } => prompt,
        }
    }

    pub fn goal_type(&self) -> &str {
        match self {
            JobPayload::ChatResponse { goal_type, .. } | JobPayload::Task { goal_type, .. } => {
                goal_type
            }
        }
    }
}

/// Token accounting accumulated from backend `usage` events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl Usage {
    pub fn add(&mut self, other: Usage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
    }
}

/// Final output of a completed job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub usage: Usage,
}

impl JobResult {
    /// The text relayed back to the originating channel.
    pub fn reply_text(&self) -> Option<&str> {
        self.stdout.as_deref().or(self.summary.as_deref())
    }
}

/// Configuration for creating a new job.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub agent_id: AgentId,
    pub session_id: SessionId,
    pub payload: JobPayload,
    pub priority: JobPriority,
    pub max_attempts: u32,
    pub timeout_ms: u64,
}

impl JobConfig {
    pub fn new(agent_id: AgentId, session_id: SessionId, payload: JobPayload) -> Self {
        Self {
            agent_id,
            session_id,
            payload,
            priority: JobPriority::Normal,
            max_attempts: 3,
            timeout_ms: 120_000,
        }
    }

    pub fn priority(mut self, priority: JobPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// A unit of agent work driven by the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub agent_id: AgentId,
    pub session_id: SessionId,
    pub payload: JobPayload,
    pub priority: JobPriority,
    pub status: JobStatus,
    /// Attempts consumed so far; incremented when a claim starts execution.
    pub attempt: u32,
    pub max_attempts: u32,
    pub timeout_ms: u64,
    /// Earliest epoch-ms a claim may pick this job up.
    pub run_at_ms: u64,
    /// Opaque resume blob written by the executing backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<serde_json::Value>,
    /// CRC32 of the serialized checkpoint, verified before resume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_crc: Option<u32>,
    /// Payload appended by an approved gate decision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_payload: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Job {
    /// Create a new job in `Pending`.
    pub fn new(config: JobConfig, clock: &impl Clock) -> Self {
        let now = clock.epoch_ms();
        Self {
            id: JobId::new(),
            agent_id: config.agent_id,
            session_id: config.session_id,
            payload: config.payload,
            priority: config.priority,
            status: JobStatus::Pending,
            attempt: 0,
            max_attempts: config.max_attempts,
            timeout_ms: config.timeout_ms,
            run_at_ms: now,
            checkpoint: None,
            checkpoint_crc: None,
            resume_payload: None,
            result: None,
            last_error: None,
            created_at_ms: now,
            updated_at_ms: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether every attempt has been consumed.
    pub fn attempts_exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }

    /// Store a checkpoint blob along with its CRC.
    pub fn set_checkpoint(&mut self, blob: serde_json::Value) -> Result<(), serde_json::Error> {
        let bytes = serde_json::to_vec(&blob)?;
        self.checkpoint_crc = Some(crc32fast::hash(&bytes));
        self.checkpoint = Some(blob);
        Ok(())
    }

    /// Verify the stored checkpoint against its CRC.
    ///
    /// A job without a checkpoint verifies trivially; a checkpoint without a
    /// CRC (or vice versa) does not.
    pub fn checkpoint_intact(&self) -> bool {
        match (&self.checkpoint, self.checkpoint_crc) {
            (None, None) => true,
            (Some(blob), Some(crc)) => match serde_json::to_vec(blob) {
                Ok(bytes) => crc32fast::hash(&bytes) == crc,
                Err(_) => false,
            },
            _ => false,
        }
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        set {
            id: JobId = JobId::from_string("job-test1"),
            agent_id: AgentId = AgentId::from_string("agt-test1"),
            session_id: SessionId = SessionId::from_string("ses-test1"),
            payload: JobPayload = JobPayload::Task {
                prompt: "hello".to_string(),
                goal_type: "research".to_string(),
            },
            priority: JobPriority = JobPriority::Normal,
            status: JobStatus = JobStatus::Pending,
            attempt: u32 = 0,
            max_attempts: u32 = 3,
            timeout_ms: u64 = 120_000,
            run_at_ms: u64 = 0,
            created_at_ms: u64 = 0,
            updated_at_ms: u64 = 0,
        }
        option {
            checkpoint: serde_json::Value = None,
            checkpoint_crc: u32 = None,
            resume_payload: serde_json::Value = None,
            result: JobResult = None,
            last_error: String = None,
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
