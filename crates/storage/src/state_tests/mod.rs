// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

mod approvals;
mod jobs;
mod sessions;

use super::ControlStore;

pub(crate) fn store() -> ControlStore {
    ControlStore::new()
}
