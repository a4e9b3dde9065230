// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state folded from WAL [`Op`](crate::op::Op) replay.

mod blobs;
mod jobs;
mod messages;
mod registry;
mod runs;
mod workflows;

use crate::op::Op;
use acp_core::{
    Blob, BlobId, Cluster, ClusterId, Event, Job, JobId, Machine, MachineId, MemoValue, Message,
    Run, RunId, Tool, ToolName, WorkflowExecution, WorkflowExecutionId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Everything the control plane knows, derived purely from `Op` replay.
///
/// All `apply_*` handlers MUST be idempotent: applying the same op twice
/// must leave state identical to applying it once, since WAL replay after a
/// crash may re-derive state from a point at or before the last write.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub clusters: HashMap<ClusterId, Cluster>,
    pub machines: HashMap<(ClusterId, MachineId), Machine>,
    pub tools: HashMap<(ClusterId, ToolName), Tool>,
    pub jobs: HashMap<(ClusterId, JobId), Job>,
    pub runs: HashMap<(ClusterId, RunId), Run>,
    pub messages: HashMap<RunId, Vec<Message>>,
    pub workflow_executions: HashMap<(ClusterId, String, WorkflowExecutionId), WorkflowExecution>,
    pub memo: HashMap<(WorkflowExecutionId, String), MemoValue>,
    pub cluster_kv: HashMap<(ClusterId, String), MemoValue>,
    pub blobs: HashMap<BlobId, Blob>,
    pub events: Vec<Event>,
}

impl MaterializedState {
    /// Fold one WAL entry into state. The sole entry point callers should
    /// use — never mutate the maps above directly outside this module.
    pub fn apply(&mut self, op: &Op) {
        match op {
            Op::ClusterUpserted(_) | Op::MachineUpserted(_) | Op::ToolUpserted(_) => {
                registry::apply(self, op)
            }

            Op::JobCreated(_)
            | Op::JobClaimed { .. }
            | Op::JobResolved { .. }
            | Op::JobInterrupted { .. }
            | Op::JobApproved { .. }
            | Op::JobRejected { .. }
            | Op::JobReclaimed { .. } => jobs::apply(self, op),

            Op::RunCreated(_)
            | Op::RunStarted { .. }
            | Op::RunPaused { .. }
            | Op::RunResumed { .. }
            | Op::RunFinished { .. }
            | Op::RunFailed { .. }
            | Op::RunOnStatusChangeSet { .. }
            | Op::RunStatusChangeDispatched { .. } => runs::apply(self, op),

            Op::MessageAppended(_) => messages::apply(self, op),

            Op::WorkflowExecutionCreated(_)
            | Op::WorkflowExecutionAttemptBegun { .. }
            | Op::WorkflowExecutionPaused { .. }
            | Op::WorkflowExecutionFinished { .. }
            | Op::WorkflowExecutionFailed { .. }
            | Op::MemoSet { .. }
            | Op::ClusterKeyValueSet { .. } => workflows::apply(self, op),

            Op::BlobRegistered(_) => blobs::apply(self, op),
        }
    }

    pub fn get_job(&self, cluster_id: &ClusterId, job_id: &JobId) -> Option<&Job> {
        self.jobs.get(&(cluster_id.clone(), job_id.clone()))
    }

    pub fn get_run(&self, cluster_id: &ClusterId, run_id: &RunId) -> Option<&Run> {
        self.runs.get(&(cluster_id.clone(), run_id.clone()))
    }

    pub fn get_tool(&self, cluster_id: &ClusterId, name: &ToolName) -> Option<&Tool> {
        self.tools.get(&(cluster_id.clone(), name.clone()))
    }

    pub fn get_machine(&self, cluster_id: &ClusterId, id: &MachineId) -> Option<&Machine> {
        self.machines.get(&(cluster_id.clone(), id.clone()))
    }

    pub fn messages_for_run(&self, run_id: &RunId) -> &[Message] {
        self.messages.get(run_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get_memo(&self, execution_id: &WorkflowExecutionId, key: &str) -> Option<&MemoValue> {
        self.memo.get(&(execution_id.clone(), key.to_string()))
    }

    pub fn get_cluster_kv(&self, cluster_id: &ClusterId, key: &str) -> Option<&MemoValue> {
        self.cluster_kv.get(&(cluster_id.clone(), key.to_string()))
    }

    pub fn get_workflow_execution(&self, execution_id: &WorkflowExecutionId) -> Option<&WorkflowExecution> {
        self.workflow_executions.values().find(|e| &e.execution_id == execution_id)
    }

    /// Runs whose current status has a not-yet-delivered `onStatusChange`
    /// target. The dispatcher sweeps this on a cadence rather than
    /// subscribing to a cursor, so a crash between transition and delivery
    /// just means the next sweep finds it again (spec §4.6 at-least-once).
    pub fn runs_needing_dispatch(&self) -> Vec<Run> {
        self.runs.values().filter(|r| r.needs_dispatch()).cloned().collect()
    }

    pub(crate) fn record_event(&mut self, event: Event) {
        self.events.push(event);
    }
}

#[cfg(test)]
#[path = "../state_tests/mod.rs"]
mod tests;
