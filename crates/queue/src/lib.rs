// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! acp-queue: job dispatch (spec §4.2) — claim algorithm, long-poll wake-up,
//! result submission, the approval cycle, and the stall reaper.

pub mod cache;
pub mod error;
pub mod notifier;
pub mod queue;
pub mod reaper;

pub use error::QueueError;
pub use queue::{ListJobsRequest, Queue};
pub use reaper::spawn_stall_reaper;
