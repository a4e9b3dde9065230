// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! acp-core: domain entities and invariants for the agent control plane.
//!
//! This crate has no I/O. It defines the entities (Cluster, Machine, Tool,
//! Job, Run, Message, WorkflowExecution, MemoKV, Event, Blob), their
//! state-machine transitions, id types, a canonical JSON-Schema IR, and the
//! shared `Clock` abstraction. Persistence (`acp-store`), dispatch
//! (`acp-queue`), and orchestration (`acp-agent`, `acp-workflow`) build on
//! top of these types but are not referenced here.

pub mod macros;

pub mod id;

pub mod clock;
pub mod error_kind;

pub mod auth;
pub mod blob;
pub mod cluster;
pub mod event;
pub mod interrupt;
pub mod job;
pub mod machine;
pub mod memo;
pub mod message;
pub mod run;
pub mod schema;
pub mod status_change;
pub mod tool;
pub mod workflow_execution;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use auth::AuthContext;
pub use blob::{Blob, BlobContentType, BlobId};
pub use clock::{Clock, FakeClock, SystemClock};
pub use cluster::{Cluster, ClusterId};
pub use error_kind::ErrorKind;
pub use event::{Event, EventFilter, EventId, EventType};
pub use id::{short, IdGen, UuidIdGen};
pub use interrupt::{InterruptPayload, InterruptType};
pub use job::{Job, JobConfig, JobId, JobStatus, ResultType};
pub use machine::{Machine, MachineId, MachineStatus};
pub use memo::{MemoConflictPolicy, MemoValue};
pub use message::{
    AgentMessageBody, Invocation, InvocationId, InvocationResultBody, Message, MessageId,
    MessageKind,
};
pub use run::{is_valid_run_id, Run, RunConfig, RunId, RunStatus, RunType};
pub use schema::{SchemaError, SchemaIr};
pub use status_change::{OnStatusChange, StatusChangeTarget};
pub use tool::{is_valid_tool_name, CacheConfig, Tool, ToolConfig, ToolName};
pub use workflow_execution::{WorkflowExecution, WorkflowExecutionId};
