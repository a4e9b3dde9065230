// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WorkflowExecution: one durable run of a registered workflow function,
//! keyed by `(clusterId, name, executionId)` (spec §5).

use crate::cluster::ClusterId;
use crate::run::RunStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Caller-supplied or server-generated; unique per `(cluster, workflow name)`.
crate::define_string_id! {
    pub struct WorkflowExecutionId;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowExecution {
    pub cluster_id: ClusterId,
    pub name: String,
    /// The registered handler version this execution is bound to — needed
    /// to re-look-up the handler on every re-trigger (spec §4.5 workflows
    /// are "named, versioned").
    pub version: u32,
    pub execution_id: WorkflowExecutionId,
    pub input: Value,
    pub status: RunStatus,
    pub result: Option<Value>,
    pub failure_reason: Option<String>,
    pub created_at_ms: u64,
    /// Incremented each time execution re-enters after a pause, so memo and
    /// agent calls can distinguish "replay" from "fresh attempt" without
    /// storing a full continuation (spec §9 Design Notes on avoiding
    /// physical continuations).
    pub attempt: u32,
}

impl WorkflowExecution {
    pub fn new(
        cluster_id: ClusterId,
        name: impl Into<String>,
        version: u32,
        execution_id: WorkflowExecutionId,
        input: Value,
        now_ms: u64,
    ) -> Self {
        Self {
            cluster_id,
            name: name.into(),
            version,
            execution_id,
            input,
            status: RunStatus::Pending,
            result: None,
            failure_reason: None,
            created_at_ms: now_ms,
            attempt: 0,
        }
    }

    pub fn begin_attempt(&mut self) {
        self.status = RunStatus::Running;
        self.attempt += 1;
    }

    pub fn pause(&mut self) {
        self.status = RunStatus::Paused;
    }

    pub fn finish(&mut self, result: Value) {
        self.status = RunStatus::Done;
        self.result = Some(result);
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        self.status = RunStatus::Failed;
        self.failure_reason = Some(reason.into());
    }
}
