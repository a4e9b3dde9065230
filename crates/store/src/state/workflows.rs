// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow execution and memo handlers.

use super::MaterializedState;
use crate::op::Op;
use acp_core::{Event, EventType};

pub(super) fn apply(state: &mut MaterializedState, op: &Op) {
    match op {
        Op::WorkflowExecutionCreated(exec) => {
            let key = (exec.cluster_id.clone(), exec.name.clone(), exec.execution_id.clone());
            if state.workflow_executions.contains_key(&key) {
                return;
            }
            state.workflow_executions.insert(key, (**exec).clone());
        }

        Op::WorkflowExecutionAttemptBegun { execution_id } => {
            with_execution_mut(state, execution_id, |e| e.begin_attempt());
        }

        Op::WorkflowExecutionPaused { execution_id } => {
            with_execution_mut(state, execution_id, |e| e.pause());
        }

        Op::WorkflowExecutionFinished { execution_id, result } => {
            let result = result.clone();
            with_execution_mut(state, execution_id, move |e| e.finish(result));
        }

        Op::WorkflowExecutionFailed { execution_id, reason } => {
            let reason = reason.clone();
            with_execution_mut(state, execution_id, move |e| e.fail(reason));
        }

        Op::MemoSet { execution_id, key, value, policy } => {
            let map_key = (execution_id.clone(), key.clone());
            let existing = state.memo.get(&map_key).cloned();
            let resolved = policy.resolve(existing, value.clone());
            state.memo.insert(map_key, resolved);
        }

        Op::ClusterKeyValueSet { cluster_id, key, value, policy } => {
            let map_key = (cluster_id.clone(), key.clone());
            let existing = state.cluster_kv.get(&map_key).cloned();
            let resolved = policy.resolve(existing, value.clone());
            state.cluster_kv.insert(map_key, resolved);
        }

        _ => {}
    }
}

fn with_execution_mut(
    state: &mut MaterializedState,
    execution_id: &acp_core::WorkflowExecutionId,
    mutate: impl FnOnce(&mut acp_core::WorkflowExecution),
) {
    let Some(key) = state
        .workflow_executions
        .keys()
        .find(|(_, _, id)| id == execution_id)
        .cloned()
    else {
        return;
    };
    let Some(exec) = state.workflow_executions.get_mut(&key) else { return };
    mutate(exec);
    let status = exec.status.to_string();
    let cluster_id = key.0.clone();
    let now_ms = exec.created_at_ms;
    state.record_event(
        Event::new(
            cluster_id,
            EventType::WorkflowExecutionStatusChanged,
            serde_json::json!({"workflowExecutionId": execution_id.as_str(), "status": status}),
            now_ms,
        )
        .with_status(status),
    );
}
