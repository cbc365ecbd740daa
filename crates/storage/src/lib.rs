// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fd-storage: durable session buffers and the in-process control store

pub mod buffer;
pub mod state;

pub use buffer::{BufferError, RecoveredSession, SessionBuffer};
pub use state::{ControlStore, StoreError};
