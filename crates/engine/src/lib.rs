// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fd-engine: the control-plane runtime core.
//!
//! Seven components, decoupled by message passing over the [`EventBus`]:
//! session buffers (fd-storage), the SSE [`StreamManager`], the
//! [`CircuitBreaker`]-backed [`ProviderRouter`], the [`JobScheduler`], the
//! [`LifecycleManager`], the [`ApprovalGate`], and the
//! [`MessageDispatcher`].

pub mod approval;
pub mod breaker;
pub mod bus;
pub mod dispatch;
pub mod lifecycle;
pub mod router;
pub mod scheduler;
pub mod stream;

pub use approval::{
    ApprovalError, ApprovalGate, CreateApproval, CreatedApproval, DecideApproval, DecideBy,
};
pub use breaker::{BreakerConfig, BreakerSnapshot, BreakerState, CircuitBreaker};
pub use bus::EventBus;
pub use dispatch::{DispatchConfig, MessageDispatcher, ERROR_REPLY, NO_AGENT_REPLY};
pub use lifecycle::{
    HydrationContext, LifecycleConfig, LifecycleError, LifecycleManager, SteerMessage,
};
pub use router::{ProviderRouter, Route, RouteError, RouterEntryConfig};
pub use scheduler::{JobScheduler, SchedulerConfig};
pub use stream::{StreamConfig, StreamEvent, StreamManager, StreamSubscription};
