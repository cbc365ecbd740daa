// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chat-channel boundary.
//!
//! Gateways (Telegram, Discord, …) implement [`ChannelAdapter`]. Adapters
//! absorb transport errors and never panic out of their handlers; the
//! control plane treats a failed send as lost, not fatal.

mod binding;
#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use binding::{BindingResolver, InMemoryBindings};
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeChannelAdapter;

use super::backend::HealthStatus;
use async_trait::async_trait;
use fd_core::{ApprovalId, RiskLevel, UserId};
use std::sync::Arc;
use thiserror::Error;

/// Errors from channel transport operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("channel transport error: {0}")]
    Transport(String),
    #[error("channel not started")]
    NotStarted,
}

/// An inbound chat message, normalized across channel types.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedMessage {
    pub channel_type: String,
    pub chat_id: String,
    pub user_account_id: UserId,
    pub text: String,
}

impl RoutedMessage {
    /// The `(channel_type, chat_id)` pair as a stable session channel key.
    pub fn channel_id(&self) -> String {
        format!("{}:{}", self.channel_type, self.chat_id)
    }
}

/// An inline button attached to an outbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineButton {
    pub label: String,
    pub callback_data: String,
}

/// An outbound chat message.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutboundMessage {
    pub text: String,
    pub inline_buttons: Vec<InlineButton>,
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), inline_buttons: Vec::new() }
    }
}

/// An approval prompt pushed to a chat channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovalNotification {
    pub approval_id: ApprovalId,
    pub summary: String,
    pub risk_level: RiskLevel,
    pub expires_at_ms: u64,
}

/// A button press on a previously sent message.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelCallback {
    pub chat_id: String,
    pub user_account_id: UserId,
    pub data: String,
}

/// Handler invoked for every inbound message. Must not panic.
pub type MessageHandler = Arc<dyn Fn(RoutedMessage) + Send + Sync>;
/// Handler invoked for every button callback. Must not panic.
pub type CallbackHandler = Arc<dyn Fn(ChannelCallback) + Send + Sync>;

/// Contract every chat gateway satisfies.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Stable channel discriminator ("telegram", "discord", …).
    fn channel_type(&self) -> &str;

    async fn start(&self) -> Result<(), ChannelError>;

    async fn stop(&self) -> Result<(), ChannelError>;

    async fn health_check(&self) -> Result<HealthStatus, ChannelError>;

    async fn send_message(
        &self,
        chat_id: &str,
        message: OutboundMessage,
    ) -> Result<(), ChannelError>;

    async fn send_approval_request(
        &self,
        chat_id: &str,
        notification: ApprovalNotification,
    ) -> Result<(), ChannelError>;

    /// Register the inbound-message handler. Later registrations replace
    /// earlier ones.
    fn on_message(&self, handler: MessageHandler);

    /// Register the button-callback handler.
    fn on_callback(&self, handler: CallbackHandler);
}
