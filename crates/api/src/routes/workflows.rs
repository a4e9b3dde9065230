// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `POST /clusters/:c/workflows/:name/executions` (spec §6, §4.5).

use crate::error::ApiError;
use crate::state::ApiState;
use acp_core::{ClusterId, IdGen, WorkflowExecution, WorkflowExecutionId};
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct CreateExecutionBody {
    #[serde(rename = "executionId", default)]
    pub execution_id: Option<String>,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub input: Value,
}

fn default_version() -> u32 {
    1
}

pub async fn create_execution(
    State(state): State<ApiState>,
    Path((cluster_id, name)): Path<(String, String)>,
    Json(body): Json<CreateExecutionBody>,
) -> Result<Json<Value>, ApiError> {
    let cluster_id = ClusterId::new(cluster_id);
    let execution_id = match body.execution_id {
        Some(id) => WorkflowExecutionId::new(id),
        None => WorkflowExecutionId::new(state.id_gen.next()),
    };
    let now_ms = state.now_ms();
    let exec = state
        .workflow_engine
        .create_execution(cluster_id, name, body.version, execution_id, body.input, now_ms, &state.id_gen)
        .await?;
    Ok(Json(execution_view(&exec)))
}

fn execution_view(exec: &WorkflowExecution) -> Value {
    serde_json::json!({
        "clusterId": exec.cluster_id,
        "name": exec.name,
        "version": exec.version,
        "executionId": exec.execution_id,
        "status": exec.status,
        "result": exec.result,
        "failureReason": exec.failure_reason,
        "createdAt": exec.created_at_ms,
        "attempt": exec.attempt,
    })
}
