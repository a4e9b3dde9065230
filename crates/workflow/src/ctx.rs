// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`WorkflowCtx`]: the durability primitives a workflow handler calls
//! into — `memo`, `agent`, `react` (spec §4.5).

use crate::error::WorkflowError;
use acp_core::{
    ClusterId, IdGen, MemoConflictPolicy, MemoValue, OnStatusChange, RunConfig, RunStatus,
    RunType, SchemaIr, WorkflowExecutionId,
};
use acp_store::{Op, Store};
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Bridges a type-erased id generator closure back into a concrete
/// `IdGen` impl. `IdGen` requires `Clone`, so it isn't object-safe — this
/// newtype is how a non-generic struct like [`WorkflowCtx`] can still hold
/// one and hand `&impl IdGen` to `acp_agent::Engine`'s generic entry points.
#[derive(Clone)]
pub struct ClosureIdGen(Arc<dyn Fn() -> String + Send + Sync>);

impl ClosureIdGen {
    pub fn wrap(id_gen: impl IdGen + 'static) -> Self {
        Self(Arc::new(move || id_gen.next()))
    }
}

impl IdGen for ClosureIdGen {
    fn next(&self) -> String {
        (self.0)()
    }
}

/// Inputs to an `agent`/`react` step: the name distinguishes steps within
/// one execution, the rest feed the deterministic run-id fingerprint and
/// the run's own configuration (spec §4.5 `agent(name, …)`).
#[derive(Debug, Clone)]
pub struct AgentStepOptions {
    pub name: String,
    pub system_prompt: Option<String>,
    pub result_schema: Option<SchemaIr>,
    pub input: Value,
}

/// `runId = executionId + "_" + name + "_" + H(systemPrompt, resultSchema,
/// wfName, version, input)` (spec §4.5). `DefaultHasher` is used rather
/// than `HashMap`'s randomized default: `DefaultHasher::new()` always uses
/// the same fixed SipHash keys, so the hash is stable across calls,
/// processes, and restarts — the determinism this id needs.
pub(crate) fn deterministic_run_id(
    execution_id: &WorkflowExecutionId,
    step_name: &str,
    fingerprint: &Value,
) -> acp_core::RunId {
    let mut hasher = DefaultHasher::new();
    fingerprint.to_string().hash(&mut hasher);
    acp_core::RunId::new(format!("{}_{}_{:016x}", execution_id.as_str(), step_name, hasher.finish()))
}

pub struct WorkflowCtx {
    store: Store,
    agent_engine: Arc<acp_agent::Engine>,
    cluster_id: ClusterId,
    execution_id: WorkflowExecutionId,
    workflow_name: String,
    workflow_version: u32,
    id_gen: ClosureIdGen,
    now_ms: u64,
}

impl WorkflowCtx {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        store: Store,
        agent_engine: Arc<acp_agent::Engine>,
        cluster_id: ClusterId,
        execution_id: WorkflowExecutionId,
        workflow_name: String,
        workflow_version: u32,
        id_gen: ClosureIdGen,
        now_ms: u64,
    ) -> Self {
        Self {
            store,
            agent_engine,
            cluster_id,
            execution_id,
            workflow_name,
            workflow_version,
            id_gen,
            now_ms,
        }
    }

    pub fn execution_id(&self) -> &WorkflowExecutionId {
        &self.execution_id
    }

    /// Durable result cell keyed `(executionId, key)`. First writer wins —
    /// a retrying handler only ever runs `compute` at most once to success
    /// per execution (spec §4.5 `memo`).
    pub fn memo(&self, key: &str, compute: impl FnOnce() -> Value) -> Result<Value, WorkflowError> {
        let existing = self.store.with_state(|s| s.get_memo(&self.execution_id, key).cloned());
        if let Some(existing) = existing.clone() {
            return Ok(existing.value);
        }
        let proposed = MemoValue::new(compute());
        self.store.apply(Op::MemoSet {
            execution_id: self.execution_id.clone(),
            key: key.to_string(),
            value: proposed.clone(),
            policy: MemoConflictPolicy::DoNothing,
        })?;
        Ok(MemoConflictPolicy::DoNothing.resolve(existing, proposed).value)
    }

    /// Trigger (or read back) a single-step, non-interactive agent run.
    /// Returns its result once `done`; raises `Terminable` if the run
    /// failed, or `Pausable` while it is still in flight (spec §4.5
    /// `agent(name, …).trigger(input)`).
    pub async fn agent(&self, opts: AgentStepOptions) -> Result<Value, WorkflowError> {
        self.trigger(opts, false).await
    }

    /// Trigger (or read back) a multi-step, interactive agent run. If
    /// `on_before_return` inspects the result and returns `Some(message)`,
    /// that message is posted to the run (continuing it) and the workflow
    /// pauses again rather than returning (spec §4.5 `react`).
    pub async fn react(
        &self,
        opts: AgentStepOptions,
        on_before_return: impl FnOnce(&Value) -> Option<String>,
    ) -> Result<Value, WorkflowError> {
        let run_id = self.run_id_for(&opts);
        let result = self.trigger(opts, true).await?;
        if let Some(message) = on_before_return(&result) {
            self.agent_engine
                .append_message(self.cluster_id.clone(), run_id, message, false, self.now_ms, &self.id_gen)
                .await?;
            return Err(WorkflowError::Pausable);
        }
        Ok(result)
    }

    fn run_id_for(&self, opts: &AgentStepOptions) -> acp_core::RunId {
        let fingerprint = serde_json::json!({
            "systemPrompt": opts.system_prompt,
            "resultSchema": opts.result_schema,
            "workflowName": self.workflow_name,
            "workflowVersion": self.workflow_version,
            "input": opts.input,
        });
        deterministic_run_id(&self.execution_id, &opts.name, &fingerprint)
    }

    async fn trigger(&self, opts: AgentStepOptions, interactive: bool) -> Result<Value, WorkflowError> {
        let run_id = self.run_id_for(&opts);
        let config = RunConfig {
            cluster_id: self.cluster_id.clone(),
            run_type: if interactive { RunType::MultiStep } else { RunType::SingleStep },
            initial_prompt: Some(opts.input.to_string()),
            result_schema: opts.result_schema.clone(),
            on_status_change: Some(OnStatusChange::Workflow {
                execution_id: self.execution_id.clone(),
                statuses: vec!["done".to_string(), "failed".to_string()],
            }),
            auth_context: None,
            additional_context: opts.system_prompt.clone().map(Value::String),
            interactive,
            enable_result_grounding: false,
            tags: Default::default(),
            workflow_execution_id: Some(self.execution_id.clone()),
        };

        let run = self.agent_engine.create_run(run_id, config, self.now_ms, &self.id_gen).await?;

        match run.status {
            RunStatus::Done => Ok(run.result.unwrap_or(Value::Null)),
            RunStatus::Failed => {
                Err(WorkflowError::Terminable(run.failure_reason.unwrap_or_default()))
            }
            RunStatus::Pending | RunStatus::Running | RunStatus::Paused => {
                Err(WorkflowError::Pausable)
            }
        }
    }
}
