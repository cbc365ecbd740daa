// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-agent SSE fan-out with ordered delivery and replay.
//!
//! Every broadcast gets an id `<agent_id>:<monotonic>` and lands in a
//! bounded replay ring; reconnecting subscribers catch up from
//! `Last-Event-ID`. Each connection owns a bounded frame queue — the queue
//! is the backpressure buffer, and overflowing it closes the connection.
//! A closed subscriber reconnects and relies on replay.

pub mod frame;

use fd_core::AgentId;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::mpsc;

/// Stream-manager tuning.
#[derive(Debug, Clone, Copy)]
pub struct StreamConfig {
    /// Events retained per agent for reconnect replay.
    pub replay_capacity: usize,
    /// Frames a slow connection may queue before it is closed.
    pub pending_capacity: usize,
    /// Interval between heartbeat comments on every connection.
    pub heartbeat_interval: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            replay_capacity: 256,
            pending_capacity: 256,
            heartbeat_interval: Duration::from_secs(30),
        }
    }
}

/// One published stream event.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEvent {
    /// `<agent_id>:<monotonic>`.
    pub id: String,
    pub seq: u64,
    pub event: String,
    /// Serialized JSON payload.
    pub data: String,
}

struct Connection {
    id: u64,
    tx: mpsc::Sender<String>,
}

#[derive(Default)]
struct AgentStream {
    next_seq: u64,
    replay: VecDeque<StreamEvent>,
    connections: Vec<Connection>,
}

/// Fan-out hub for all agent streams.
pub struct StreamManager {
    config: StreamConfig,
    agents: Mutex<HashMap<String, AgentStream>>,
    next_connection_id: Mutex<u64>,
}

impl StreamManager {
    pub fn new(config: StreamConfig) -> Self {
        Self { config, agents: Mutex::new(HashMap::new()), next_connection_id: Mutex::new(0) }
    }

    /// Publish one event on an agent's stream.
    ///
    /// Assigns the next id, stores the event for replay, and writes the
    /// frame to every open connection. Connections whose queue is full are
    /// closed and pruned. Returns the published event.
    pub fn broadcast(
        &self,
        agent_id: &AgentId,
        event: &str,
        payload: &serde_json::Value,
    ) -> StreamEvent {
        let mut agents = self.agents.lock();
        let stream = agents.entry(agent_id.to_string()).or_default();

        stream.next_seq += 1;
        let seq = stream.next_seq;
        let published = StreamEvent {
            id: format!("{agent_id}:{seq}"),
            seq,
            event: event.to_string(),
            data: payload.to_string(),
        };

        stream.replay.push_back(published.clone());
        while stream.replay.len() > self.config.replay_capacity {
            stream.replay.pop_front();
        }

        let frame = frame::format_event(&published.id, &published.event, &published.data);
        stream.connections.retain(|conn| match conn.tx.try_send(frame.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(
                    agent_id = %agent_id,
                    connection = conn.id,
                    "stream connection overflowed, closing"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });

        published
    }

    /// Open a subscriber connection.
    ///
    /// When `last_event_id` parses and is still in the replay ring, every
    /// later event is replayed in order; otherwise the entire ring is
    /// replayed. Frames queued here count against the connection's pending
    /// budget.
    pub fn connect(&self, agent_id: &AgentId, last_event_id: Option<&str>) -> StreamSubscription {
        let (tx, rx) = mpsc::channel(self.config.pending_capacity);

        let connection_id = {
            let mut next = self.next_connection_id.lock();
            *next += 1;
            *next
        };

        let mut agents = self.agents.lock();
        let stream = agents.entry(agent_id.to_string()).or_default();

        let after_seq = last_event_id
            .and_then(|id| frame::parse_event_seq(agent_id.as_str(), id))
            .filter(|seq| stream.replay.iter().any(|e| e.seq == *seq))
            .unwrap_or(0);
        for event in stream.replay.iter().filter(|e| e.seq > after_seq) {
            let frame = frame::format_event(&event.id, &event.event, &event.data);
            if tx.try_send(frame).is_err() {
                break;
            }
        }

        stream.connections.push(Connection { id: connection_id, tx });
        tracing::debug!(agent_id = %agent_id, connection = connection_id, "stream connected");

        StreamSubscription {
            agent_id: *agent_id,
            rx,
            heartbeat_interval: self.config.heartbeat_interval,
            heartbeat: None,
        }
    }

    /// Number of open connections for an agent.
    pub fn connection_count(&self, agent_id: &AgentId) -> usize {
        self.agents.lock().get(agent_id.as_str()).map_or(0, |s| s.connections.len())
    }

    /// Close every connection for an agent and clear its replay ring.
    /// The monotonic id counter survives so reconnects never see an id
    /// reused.
    pub fn disconnect_all(&self, agent_id: &AgentId) {
        let mut agents = self.agents.lock();
        if let Some(stream) = agents.get_mut(agent_id.as_str()) {
            stream.connections.clear();
            stream.replay.clear();
        }
    }

    /// Close every connection for every agent.
    pub fn shutdown(&self) {
        let mut agents = self.agents.lock();
        for stream in agents.values_mut() {
            stream.connections.clear();
        }
    }
}

impl Default for StreamManager {
    fn default() -> Self {
        Self::new(StreamConfig::default())
    }
}

/// Subscriber half of one stream connection.
///
/// `next_frame` yields wire-ready frames, interleaving heartbeat comments
/// whenever the stream stays quiet for a heartbeat interval. Returns `None`
/// once the connection is closed by the manager.
pub struct StreamSubscription {
    pub agent_id: AgentId,
    rx: mpsc::Receiver<String>,
    heartbeat_interval: Duration,
    heartbeat: Option<tokio::time::Interval>,
}

impl StreamSubscription {
    pub async fn next_frame(&mut self) -> Option<String> {
        let heartbeat = self.heartbeat.get_or_insert_with(|| {
            // First fire lands one full interval after the first poll, not
            // immediately on connect
            let start = tokio::time::Instant::now() + self.heartbeat_interval;
            tokio::time::interval_at(start, self.heartbeat_interval)
        });
        tokio::select! {
            frame = self.rx.recv() => frame,
            _ = heartbeat.tick() => Some(frame::HEARTBEAT.to_string()),
        }
    }

    /// Drain frames already queued, without waiting. Test helper for
    /// observing replay output.
    pub fn drain_ready(&mut self) -> Vec<String> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.rx.try_recv() {
            frames.push(frame);
        }
        frames
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
