// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Op`: the unit of the write-ahead log. Every state mutation the control
//! plane makes is first appended as an `Op`, then folded into
//! [`crate::state::MaterializedState`] by [`crate::state::MaterializedState::apply`].
//! This is distinct from [`acp_core::Event`], which is the externally
//! queryable audit log derived from applying certain ops.

use acp_core::{
    Blob, Cluster, InterruptType, Job, JobId, Machine, MachineId, MemoConflictPolicy, MemoValue,
    Message, OnStatusChange, ResultType, Run, RunId, Tool, WorkflowExecution, WorkflowExecutionId,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Op {
    ClusterUpserted(Cluster),
    MachineUpserted(Machine),
    ToolUpserted(Tool),

    JobCreated(Box<Job>),
    JobClaimed { cluster_id: acp_core::ClusterId, job_id: JobId, machine_id: MachineId, now_ms: u64 },
    JobResolved {
        cluster_id: acp_core::ClusterId,
        job_id: JobId,
        result_type: ResultType,
        result: Value,
    },
    JobInterrupted {
        cluster_id: acp_core::ClusterId,
        job_id: JobId,
        interrupt_type: InterruptType,
        result: Value,
    },
    JobApproved { cluster_id: acp_core::ClusterId, job_id: JobId },
    JobRejected { cluster_id: acp_core::ClusterId, job_id: JobId },
    JobReclaimed { cluster_id: acp_core::ClusterId, job_id: JobId },

    RunCreated(Box<Run>),
    RunStarted { cluster_id: acp_core::ClusterId, run_id: RunId },
    RunPaused { cluster_id: acp_core::ClusterId, run_id: RunId },
    RunResumed { cluster_id: acp_core::ClusterId, run_id: RunId },
    RunFinished { cluster_id: acp_core::ClusterId, run_id: RunId, result: Value },
    RunFailed { cluster_id: acp_core::ClusterId, run_id: RunId, reason: String },
    RunOnStatusChangeSet {
        cluster_id: acp_core::ClusterId,
        run_id: RunId,
        on_status_change: Option<OnStatusChange>,
    },
    RunStatusChangeDispatched { cluster_id: acp_core::ClusterId, run_id: RunId },

    MessageAppended(Box<Message>),

    WorkflowExecutionCreated(Box<WorkflowExecution>),
    WorkflowExecutionAttemptBegun { execution_id: WorkflowExecutionId },
    WorkflowExecutionPaused { execution_id: WorkflowExecutionId },
    WorkflowExecutionFinished { execution_id: WorkflowExecutionId, result: Value },
    WorkflowExecutionFailed { execution_id: WorkflowExecutionId, reason: String },

    MemoSet {
        execution_id: WorkflowExecutionId,
        key: String,
        value: MemoValue,
        policy: MemoConflictPolicy,
    },

    /// The externally-addressable `(clusterId, key) -> value` MemoKV (spec
    /// §3, `PUT/GET /clusters/:c/keys/:key`) — distinct from workflow
    /// `memo()` cells, which are scoped to a single execution rather than a
    /// whole cluster.
    ClusterKeyValueSet {
        cluster_id: acp_core::ClusterId,
        key: String,
        value: MemoValue,
        policy: MemoConflictPolicy,
    },

    BlobRegistered(Box<Blob>),
}
