// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only per-job session log with crash recovery.
//!
//! Layout: `<root>/<job_id>/session-NNN.jsonl`, one serialized
//! [`SessionEvent`] per line. `NNN` increments each time the job is resumed
//! in a new process; `metadata.json` in the job directory holds the highest
//! counter. Lines are flushed to stable storage before `append` returns, so
//! a torn trailing line can only be the result of a mid-write kill and is
//! discarded on recovery.

use fd_core::{JobId, SessionEvent};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from session-buffer operations.
///
/// I/O failures (including disk-full) surface here and must be propagated
/// by callers as transient task failures.
#[derive(Debug, Error)]
pub enum BufferError {
    #[error("buffer io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("buffer serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Metadata {
    session_counter: u32,
}

/// Result of recovering a job's buffer after a crash.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveredSession {
    /// Most recent `CHECKPOINT` event, if any was flushed.
    pub last_checkpoint: Option<SessionEvent>,
    /// Events after the checkpoint (or since `SESSION_START` when no
    /// checkpoint exists), in append order.
    pub events_since_checkpoint: Vec<SessionEvent>,
    /// The session file that was recovered, absent when the job never wrote.
    pub session_file: Option<PathBuf>,
}

impl RecoveredSession {
    fn empty() -> Self {
        Self { last_checkpoint: None, events_since_checkpoint: Vec::new(), session_file: None }
    }
}

/// Single-writer append handle for one job's session log.
pub struct SessionBuffer {
    job_id: JobId,
    path: PathBuf,
    file: File,
    next_sequence: u64,
}

impl SessionBuffer {
    /// Open a fresh session file for a job, bumping the session counter.
    ///
    /// Creates `<root>/<job_id>/` on first use. Each call starts a new
    /// `session-NNN.jsonl`; the previous file stays behind for recovery and
    /// audit.
    pub fn open(root: &Path, job_id: JobId) -> Result<Self, BufferError> {
        let dir = root.join(job_id.as_str());
        fs::create_dir_all(&dir)?;

        let counter = bump_session_counter(&dir)?;
        let path = dir.join(format!("session-{counter:03}.jsonl"));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        tracing::debug!(job_id = %job_id, path = %path.display(), "session buffer opened");
        Ok(Self { job_id, path, file, next_sequence: 1 })
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn session_file(&self) -> &Path {
        &self.path
    }

    /// Sequence the next append will be assigned.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Append one event, assigning its sequence and flushing to stable
    /// storage before returning. Returns the event as written.
    pub fn append(&mut self, mut event: SessionEvent) -> Result<SessionEvent, BufferError> {
        event.sequence = self.next_sequence;
        let mut line = serde_json::to_vec(&event)?;
        line.push(b'\n');
        self.file.write_all(&line)?;
        self.file.flush()?;
        self.file.sync_data()?;
        self.next_sequence += 1;
        Ok(event)
    }

    /// Recover the latest session of a job.
    ///
    /// Picks the greatest `session-*.jsonl`, stream-parses it, discards a
    /// torn trailing line, and splits the history at the most recent
    /// checkpoint.
    pub fn recover(root: &Path, job_id: &JobId) -> Result<RecoveredSession, BufferError> {
        let dir = root.join(job_id.as_str());
        let Some(path) = latest_session_file(&dir)? else {
            return Ok(RecoveredSession::empty());
        };

        let mut last_checkpoint: Option<SessionEvent> = None;
        let mut since: Vec<SessionEvent> = Vec::new();

        let reader = BufReader::new(File::open(&path)?);
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let event: SessionEvent = match serde_json::from_str(&line) {
                Ok(event) => event,
                Err(err) => {
                    // A partial flush can only tear the tail; everything
                    // from the torn line on is unrecoverable.
                    tracing::warn!(
                        job_id = %job_id,
                        path = %path.display(),
                        error = %err,
                        "discarding torn tail of session file"
                    );
                    break;
                }
            };
            if event.is_checkpoint() {
                last_checkpoint = Some(event);
                since.clear();
            } else {
                since.push(event);
            }
        }

        Ok(RecoveredSession {
            last_checkpoint,
            events_since_checkpoint: since,
            session_file: Some(path),
        })
    }
}

/// Read, increment, and persist the session counter in `metadata.json`.
fn bump_session_counter(dir: &Path) -> Result<u32, BufferError> {
    let meta_path = dir.join("metadata.json");
    let mut meta: Metadata = match fs::read(&meta_path) {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Metadata::default(),
        Err(err) => return Err(err.into()),
    };
    meta.session_counter += 1;
    fs::write(&meta_path, serde_json::to_vec(&meta)?)?;
    Ok(meta.session_counter)
}

/// Find the session file with the greatest counter, if any.
fn latest_session_file(dir: &Path) -> Result<Option<PathBuf>, BufferError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };

    let mut best: Option<(u32, PathBuf)> = None;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(counter) = parse_session_counter(name) else { continue };
        if best.as_ref().is_none_or(|(n, _)| counter > *n) {
            best = Some((counter, entry.path()));
        }
    }
    Ok(best.map(|(_, path)| path))
}

fn parse_session_counter(name: &str) -> Option<u32> {
    name.strip_prefix("session-")?.strip_suffix(".jsonl")?.parse().ok()
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
