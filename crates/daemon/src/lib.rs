// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! acp-daemon: the control plane binary — wires the store, queue, agent and
//! workflow engines, and dispatcher together behind the `acp-api` HTTP
//! surface, matching the teacher's `oj-daemon` startup/shutdown split.

pub mod config;
pub mod lifecycle;
pub mod logging;
pub mod model;

pub use config::{Config, ConfigError};
pub use lifecycle::{run, LifecycleError};
