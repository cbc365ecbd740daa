// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fd-adapters: boundary contracts for backends, channels, credentials,
//! and memory, plus the in-process reference implementations.

pub mod backend;
pub mod channel;
pub mod credentials;
pub mod memory;

pub use backend::{
    BackendError, EchoBackend, ExecutionBackend, ExecutionHandle, HealthStatus, ENV_ALLOWLIST,
};
#[cfg(any(test, feature = "test-support"))]
pub use backend::{ScriptEntry, ScriptedBackend};
pub use channel::{
    ApprovalNotification, BindingResolver, ChannelAdapter, ChannelCallback, ChannelError,
    InMemoryBindings, InlineButton, MessageHandler, OutboundMessage, RoutedMessage,
};
#[cfg(any(test, feature = "test-support"))]
pub use channel::FakeChannelAdapter;
pub use credentials::{
    CredentialKind, CredentialStatus, CredentialStore, InMemoryCredentialStore,
    ProviderCredential, Secret,
};
pub use memory::{cosine_similarity, embed_text, InMemoryMemoryStore, MemoryRecord, MemoryStore};
