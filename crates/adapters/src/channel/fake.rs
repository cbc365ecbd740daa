// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake channel adapter for tests: records sends, lets tests inject
//! inbound messages and callbacks.

use super::{
    ApprovalNotification, CallbackHandler, ChannelAdapter, ChannelCallback, ChannelError,
    MessageHandler, OutboundMessage, RoutedMessage,
};
use crate::backend::HealthStatus;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct FakeChannelState {
    sent: Vec<(String, OutboundMessage)>,
    approval_requests: Vec<(String, ApprovalNotification)>,
    message_handler: Option<MessageHandler>,
    callback_handler: Option<CallbackHandler>,
    fail_sends: bool,
}

/// Test double for a chat gateway.
#[derive(Clone, Default)]
pub struct FakeChannelAdapter {
    channel_type: &'static str,
    state: Arc<Mutex<FakeChannelState>>,
}

impl FakeChannelAdapter {
    pub fn new(channel_type: &'static str) -> Self {
        Self { channel_type, state: Arc::default() }
    }

    /// Make subsequent sends fail with a transport error.
    pub fn fail_sends(&self, fail: bool) {
        self.state.lock().fail_sends = fail;
    }

    /// Deliver an inbound message to the registered handler, if any.
    pub fn inject_message(&self, message: RoutedMessage) {
        let handler = self.state.lock().message_handler.clone();
        if let Some(handler) = handler {
            handler(message);
        }
    }

    /// Deliver a button callback to the registered handler, if any.
    pub fn inject_callback(&self, callback: ChannelCallback) {
        let handler = self.state.lock().callback_handler.clone();
        if let Some(handler) = handler {
            handler(callback);
        }
    }

    /// Messages sent so far as `(chat_id, message)` pairs.
    pub fn sent(&self) -> Vec<(String, OutboundMessage)> {
        self.state.lock().sent.clone()
    }

    /// Approval notifications sent so far.
    pub fn approval_requests(&self) -> Vec<(String, ApprovalNotification)> {
        self.state.lock().approval_requests.clone()
    }
}

#[async_trait]
impl ChannelAdapter for FakeChannelAdapter {
    fn channel_type(&self) -> &str {
        self.channel_type
    }

    async fn start(&self) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn stop(&self) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthStatus, ChannelError> {
        Ok(HealthStatus { healthy: true, latency_ms: 0 })
    }

    async fn send_message(
        &self,
        chat_id: &str,
        message: OutboundMessage,
    ) -> Result<(), ChannelError> {
        let mut state = self.state.lock();
        if state.fail_sends {
            return Err(ChannelError::Transport("send failed".to_string()));
        }
        state.sent.push((chat_id.to_string(), message));
        Ok(())
    }

    async fn send_approval_request(
        &self,
        chat_id: &str,
        notification: ApprovalNotification,
    ) -> Result<(), ChannelError> {
        let mut state = self.state.lock();
        if state.fail_sends {
            return Err(ChannelError::Transport("send failed".to_string()));
        }
        state.approval_requests.push((chat_id.to_string(), notification));
        Ok(())
    }

    fn on_message(&self, handler: MessageHandler) {
        self.state.lock().message_handler = Some(handler);
    }

    fn on_callback(&self, handler: CallbackHandler) {
        self.state.lock().callback_handler = Some(handler);
    }
}
