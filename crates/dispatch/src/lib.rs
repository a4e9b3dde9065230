// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! acp-dispatch: delivers `onStatusChange` notifications when a run
//! transitions into one of its configured terminal statuses (spec §4.6).

pub mod dispatcher;
pub mod error;
pub mod retry;
pub mod webhook;

pub use dispatcher::{spawn_dispatch_worker, Dispatcher};
pub use error::DispatchError;
pub use retry::RetryPolicy;
