// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// A workflow handler's outcome is always one of: succeed with a value,
/// or raise one of these two control-flow signals (spec §4.5). Neither is
/// a Rust panic or an unwound continuation — a handler that awaits a
/// not-yet-terminal agent run just returns `Err(WorkflowError::Pausable)`
/// and is re-entered later from the top (Design Notes §9: no in-process
/// continuations across a persistence boundary). The remaining variants
/// are ordinary infrastructure failures surfaced by `WorkflowEngine::drive`.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The handler (or a dependent agent run) failed terminally; the
    /// execution ends in `failed` with this as `failureReason`.
    #[error("{0}")]
    Terminable(String),
    /// A dependent agent run is not yet terminal; the execution pauses and
    /// is re-entered once the status-change dispatcher re-triggers it.
    #[error("workflow paused, awaiting a dependent run")]
    Pausable,
    #[error("workflow '{0}' version {1} is not registered")]
    NotRegistered(String, u32),
    #[error("workflow execution not found: {0}")]
    ExecutionNotFound(String),
    #[error(transparent)]
    Store(#[from] acp_store::StoreError),
    #[error(transparent)]
    Agent(#[from] acp_agent::AgentError),
}
