// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `POST /clusters/:c/runs`, `GET .../runs/:r`, and the transcript endpoints
//! `GET/POST .../runs/:r/messages` (spec §6, §4.4).

use crate::error::ApiError;
use crate::state::ApiState;
use acp_core::{
    is_valid_run_id, AuthContext, ClusterId, IdGen, Message, MessageKind, OnStatusChange, Run,
    RunId, RunType, SchemaIr, WorkflowExecutionId,
};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
pub struct CreateRunBody {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "runType", default = "default_run_type")]
    pub run_type: RunType,
    #[serde(rename = "initialPrompt", default)]
    pub initial_prompt: Option<String>,
    #[serde(rename = "resultSchema", default)]
    pub result_schema: Option<Value>,
    #[serde(rename = "onStatusChange", default)]
    pub on_status_change: Option<OnStatusChange>,
    #[serde(rename = "authContext", default)]
    pub auth_context: Option<Value>,
    #[serde(rename = "additionalContext", default)]
    pub additional_context: Option<Value>,
    #[serde(default)]
    pub interactive: bool,
    #[serde(rename = "enableResultGrounding", default)]
    pub enable_result_grounding: bool,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(rename = "workflowExecutionId", default)]
    pub workflow_execution_id: Option<String>,
}

fn default_run_type() -> RunType {
    RunType::SingleStep
}

pub async fn create_run(
    State(state): State<ApiState>,
    Path(cluster_id): Path<String>,
    Json(body): Json<CreateRunBody>,
) -> Result<Json<Value>, ApiError> {
    let id = match body.id {
        Some(id) => {
            if !is_valid_run_id(&id) {
                return Err(ApiError::Validation(format!("invalid run id: {id}")));
            }
            RunId::new(id)
        }
        None => RunId::new(state.id_gen.next()),
    };

    let config = acp_core::RunConfig {
        cluster_id: ClusterId::new(cluster_id),
        run_type: body.run_type,
        initial_prompt: body.initial_prompt,
        result_schema: body.result_schema.map(SchemaIr::new),
        on_status_change: body.on_status_change,
        auth_context: body.auth_context.map(AuthContext::from),
        additional_context: body.additional_context,
        interactive: body.interactive,
        enable_result_grounding: body.enable_result_grounding,
        tags: body.tags,
        workflow_execution_id: body.workflow_execution_id.map(WorkflowExecutionId::new),
    };

    let now_ms = state.now_ms();
    let run = state.agent_engine.create_run(id, config, now_ms, &state.id_gen).await?;
    Ok(Json(run_view(&run)))
}

pub async fn get_run(
    State(state): State<ApiState>,
    Path((cluster_id, run_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let cluster_id = ClusterId::new(cluster_id);
    let run_id = RunId::new(run_id);
    let run = state
        .store
        .with_state(|s| s.get_run(&cluster_id, &run_id).cloned())
        .ok_or_else(|| ApiError::NotFound(format!("run {run_id} not found")))?;
    Ok(Json(run_view(&run)))
}

#[derive(Debug, Deserialize)]
pub struct ListMessagesQuery {
    #[serde(default)]
    pub after: Option<String>,
    #[serde(rename = "waitTime", default)]
    pub wait_time_seconds: u64,
}

pub async fn list_messages(
    State(state): State<ApiState>,
    Path((cluster_id, run_id)): Path<(String, String)>,
    Query(query): Query<ListMessagesQuery>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let _cluster_id = ClusterId::new(cluster_id);
    let run_id = RunId::new(run_id);

    const TICK: Duration = Duration::from_millis(250);
    let deadline = Duration::from_secs(query.wait_time_seconds);
    let started = tokio::time::Instant::now();

    loop {
        let messages = state.store.with_state(|s| {
            s.messages_for_run(&run_id)
                .iter()
                .filter(|m| match &query.after {
                    Some(cursor) => m.id.as_str() > cursor.as_str(),
                    None => true,
                })
                .map(message_view)
                .collect::<Vec<_>>()
        });
        if !messages.is_empty() || started.elapsed() >= deadline {
            return Ok(Json(messages));
        }
        sleep(TICK.min(deadline.saturating_sub(started.elapsed()))).await;
    }
}

#[derive(Debug, Deserialize)]
pub struct AppendMessageBody {
    pub content: String,
    #[serde(default)]
    pub supervisor: bool,
}

pub async fn append_message(
    State(state): State<ApiState>,
    Path((cluster_id, run_id)): Path<(String, String)>,
    Json(body): Json<AppendMessageBody>,
) -> Result<Json<Value>, ApiError> {
    let cluster_id = ClusterId::new(cluster_id);
    let run_id = RunId::new(run_id);
    let now_ms = state.now_ms();
    let run = state
        .agent_engine
        .append_message(cluster_id, run_id, body.content, body.supervisor, now_ms, &state.id_gen)
        .await?;
    Ok(Json(run_view(&run)))
}

fn run_view(run: &Run) -> Value {
    serde_json::json!({
        "id": run.id,
        "clusterId": run.cluster_id,
        "runType": run.run_type,
        "status": run.status,
        "result": run.result,
        "failureReason": run.failure_reason,
        "onStatusChange": run.on_status_change,
        "createdAt": run.created_at_ms,
        "interactive": run.interactive,
        "tags": run.tags,
        "workflowExecutionId": run.workflow_execution_id,
        "feedbackScore": run.feedback_score,
        "feedbackComment": run.feedback_comment,
    })
}

fn message_view(message: &Message) -> Value {
    let (kind, detail) = match &message.kind {
        MessageKind::Human { content } => ("human", serde_json::json!({"content": content})),
        MessageKind::Agent(body) => ("agent", serde_json::to_value(body).unwrap_or(Value::Null)),
        MessageKind::InvocationResult(body) => {
            ("invocation_result", serde_json::to_value(body).unwrap_or(Value::Null))
        }
        MessageKind::Template { content } => ("template", serde_json::json!({"content": content})),
        MessageKind::Supervisor { content } => ("supervisor", serde_json::json!({"content": content})),
        MessageKind::AgentInvalid { raw, validation_error } => {
            ("agent_invalid", serde_json::json!({"raw": raw, "validationError": validation_error}))
        }
    };
    serde_json::json!({
        "id": message.id,
        "runId": message.run_id,
        "createdAt": message.created_at_ms,
        "type": kind,
        "data": detail,
    })
}
