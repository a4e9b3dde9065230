// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! acp-workflow: durable, memoized, pausable workflow execution (spec §4.5).
//!
//! A workflow is a named, versioned handler that runs to completion across
//! any number of pause/resume cycles driven by dependent agent runs, using
//! [`WorkflowCtx::memo`] and [`WorkflowCtx::agent`]/[`WorkflowCtx::react`]
//! as its only durability primitives.

pub mod ctx;
pub mod engine;
pub mod error;

pub use ctx::{AgentStepOptions, WorkflowCtx};
pub use engine::{WorkflowEngine, WorkflowHandler};
pub use error::WorkflowError;
