// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broadcast event bus decoupling the runtime components.
//!
//! The lifecycle manager, router, scheduler, and approval gate publish;
//! the stream manager and dispatcher subscribe. No component holds a
//! reference to another through the bus, which is what breaks the
//! lifecycle ↔ scheduler ↔ stream-manager reference cycle.

use fd_core::Event;
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 1_024;

/// Cloneable handle to the control-plane event bus.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event. Lossy by design: with no subscribers the event is
    /// dropped, and a slow subscriber observes `Lagged` on its receiver.
    pub fn emit(&self, event: Event) {
        tracing::debug!(event = event.name(), "bus emit");
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Number of live subscribers, for status reporting.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
