// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`WorkflowEngine`]: registers workflow handlers by `(name, version)` and
//! drives executions through them (spec §4.5).
//!
//! The original system dispatches a workflow's handler to an SDK-hosted
//! worker as a private tool job (`workflows_<name>_<version>`). This
//! reimplementation runs handlers in-process instead — SDK wire formats are
//! out of scope (spec §9 Non-goals), and the durability guarantees spec §4.5
//! promises (`memo` exactly-once, stable agent run ids, idempotent
//! re-trigger) don't depend on where the handler code physically executes,
//! only on `WorkflowCtx` routing through the Store. No `Tool`/`Job` record
//! is ever minted for a workflow as a result.

use crate::ctx::{ClosureIdGen, WorkflowCtx};
use crate::error::WorkflowError;
use acp_core::{ClusterId, IdGen, WorkflowExecution, WorkflowExecutionId};
use acp_store::{Op, Store};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A registered workflow's deterministic business logic. Mirrors
/// `acp_agent::Model`'s adapter-injection shape: one capability, injected
/// by name, with no knowledge of how it's invoked.
#[async_trait]
pub trait WorkflowHandler: Send + Sync {
    async fn handle(&self, ctx: &WorkflowCtx, input: Value) -> Result<Value, WorkflowError>;
}

pub struct WorkflowEngine {
    store: Store,
    agent_engine: Arc<acp_agent::Engine>,
    handlers: RwLock<HashMap<(String, u32), Arc<dyn WorkflowHandler>>>,
}

impl WorkflowEngine {
    pub fn new(store: Store, agent_engine: Arc<acp_agent::Engine>) -> Self {
        Self { store, agent_engine, handlers: RwLock::new(HashMap::new()) }
    }

    pub fn register(&self, name: impl Into<String>, version: u32, handler: Arc<dyn WorkflowHandler>) {
        self.handlers.write().insert((name.into(), version), handler);
    }

    /// Idempotent create: if `execution_id` already names an execution,
    /// return it unchanged rather than re-running the handler from scratch
    /// (spec §4.5 `createWorkflowExecution` is "an idempotent create").
    /// Otherwise creates it and immediately drives the first attempt.
    pub async fn create_execution(
        &self,
        cluster_id: ClusterId,
        name: impl Into<String>,
        version: u32,
        execution_id: WorkflowExecutionId,
        input: Value,
        now_ms: u64,
        id_gen: &impl IdGen,
    ) -> Result<WorkflowExecution, WorkflowError> {
        let name = name.into();
        if let Some(existing) = self.store.with_state(|s| s.get_workflow_execution(&execution_id).cloned()) {
            return Ok(existing);
        }
        let exec =
            WorkflowExecution::new(cluster_id.clone(), name.clone(), version, execution_id.clone(), input, now_ms);
        self.store.apply(Op::WorkflowExecutionCreated(Box::new(exec)))?;
        self.drive(cluster_id, name, version, execution_id, now_ms, id_gen).await
    }

    /// Re-enter a workflow execution's handler: begins a new attempt,
    /// invokes the registered handler with a fresh [`WorkflowCtx`], and
    /// records the outcome (done/paused/failed). Called on first creation
    /// and again whenever the status-change dispatcher re-triggers a
    /// paused execution (spec §4.5 pause/resume protocol step 2).
    pub async fn drive(
        &self,
        cluster_id: ClusterId,
        name: String,
        version: u32,
        execution_id: WorkflowExecutionId,
        now_ms: u64,
        id_gen: &impl IdGen,
    ) -> Result<WorkflowExecution, WorkflowError> {
        let handler = self
            .handlers
            .read()
            .get(&(name.clone(), version))
            .cloned()
            .ok_or_else(|| WorkflowError::NotRegistered(name.clone(), version))?;

        let exec = self
            .store
            .with_state(|s| s.get_workflow_execution(&execution_id).cloned())
            .ok_or_else(|| WorkflowError::ExecutionNotFound(execution_id.as_str().to_string()))?;
        if exec.status.is_terminal() {
            return Ok(exec);
        }

        self.store.apply(Op::WorkflowExecutionAttemptBegun { execution_id: execution_id.clone() })?;

        let ctx = WorkflowCtx::new(
            self.store.clone(),
            self.agent_engine.clone(),
            cluster_id,
            execution_id.clone(),
            name,
            version,
            ClosureIdGen::wrap(id_gen.clone()),
            now_ms,
        );

        match handler.handle(&ctx, exec.input.clone()).await {
            Ok(result) => {
                tracing::debug!(execution_id = %execution_id, "workflow execution finished");
                self.store.apply(Op::WorkflowExecutionFinished { execution_id: execution_id.clone(), result })?;
            }
            Err(WorkflowError::Pausable) => {
                tracing::debug!(execution_id = %execution_id, "workflow execution paused");
                self.store.apply(Op::WorkflowExecutionPaused { execution_id: execution_id.clone() })?;
            }
            Err(WorkflowError::Terminable(reason)) => {
                tracing::warn!(execution_id = %execution_id, %reason, "workflow execution failed");
                self.store
                    .apply(Op::WorkflowExecutionFailed { execution_id: execution_id.clone(), reason })?;
            }
            Err(other) => return Err(other),
        }

        self.store
            .with_state(|s| s.get_workflow_execution(&execution_id).cloned())
            .ok_or_else(|| WorkflowError::ExecutionNotFound(execution_id.as_str().to_string()))
    }
}
