// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SSE wire framing.
//!
//! Standard framing: `id:<id>`, `event:<name>`, one `data:` line per line
//! of payload, blank-line terminated. Heartbeats are comment lines.

/// Content type every stream response carries.
pub const CONTENT_TYPE: &str = "text/event-stream";
/// Cache directive for stream responses.
pub const CACHE_CONTROL: &str = "no-cache";
/// Disables proxy buffering on nginx-style front ends.
pub const X_ACCEL_BUFFERING: &str = "no";

/// Heartbeat comment frame.
pub const HEARTBEAT: &str = ":heartbeat\n\n";

/// Frame one event for the wire.
pub fn format_event(id: &str, event: &str, data: &str) -> String {
    let mut frame = String::with_capacity(id.len() + event.len() + data.len() + 24);
    frame.push_str("id:");
    frame.push_str(id);
    frame.push_str("\nevent:");
    frame.push_str(event);
    frame.push('\n');
    for line in data.split('\n') {
        frame.push_str("data:");
        frame.push_str(line);
        frame.push('\n');
    }
    frame.push('\n');
    frame
}

/// Parse the monotonic sequence out of an `<agent_id>:<monotonic>` event id.
///
/// Returns `None` when the id does not belong to `agent_id`.
pub fn parse_event_seq(agent_id: &str, event_id: &str) -> Option<u64> {
    let rest = event_id.strip_prefix(agent_id)?;
    rest.strip_prefix(':')?.parse().ok()
}
