// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `POST/GET /clusters/:c/jobs`, `/jobs/:j`, `/jobs/:j/result`,
//! `/jobs/:j/approval` (spec §6, §4.2).

use crate::error::ApiError;
use crate::state::ApiState;
use acp_core::{
    AuthContext, ClusterId, IdGen, Job, JobConfig, JobId, MachineId, ResultType, RunId, ToolConfig,
    ToolName, WorkflowExecutionId,
};
use acp_queue::ListJobsRequest;
use acp_registry::MachineHeartbeat;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
pub struct CreateJobBody {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "targetFn")]
    pub target_fn: String,
    #[serde(rename = "targetArgs")]
    pub target_args: Value,
    #[serde(rename = "runId", default)]
    pub run_id: Option<String>,
    #[serde(rename = "workflowExecutionId", default)]
    pub workflow_execution_id: Option<String>,
    #[serde(rename = "toolConfig", default)]
    pub tool_config: ToolConfig,
    #[serde(rename = "authContext", default)]
    pub auth_context: Option<Value>,
    #[serde(rename = "runContext", default)]
    pub run_context: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct CreateJobQuery {
    #[serde(rename = "waitTime", default)]
    pub wait_time_seconds: Option<u64>,
}

pub async fn create_job(
    State(state): State<ApiState>,
    Path(cluster_id): Path<String>,
    Query(query): Query<CreateJobQuery>,
    Json(body): Json<CreateJobBody>,
) -> Result<Json<Value>, ApiError> {
    if !acp_core::is_valid_tool_name(&body.target_fn) {
        return Err(ApiError::Validation(format!("invalid targetFn: {}", body.target_fn)));
    }
    let cluster_id = ClusterId::new(cluster_id);
    let now_ms = state.now_ms();
    let id = match body.id {
        Some(id) => JobId::new(id),
        None => JobId::new(state.id_gen.next()),
    };
    let config = JobConfig {
        cluster_id: cluster_id.clone(),
        run_id: body.run_id.map(RunId::new),
        workflow_execution_id: body.workflow_execution_id.map(WorkflowExecutionId::new),
        target_fn: body.target_fn,
        target_args: body.target_args,
        tool_config: body.tool_config,
        cache_key: None,
        auth_context: body.auth_context.map(AuthContext::from),
        run_context: body.run_context,
    };
    let job = state.queue.create_job(id, config, now_ms)?;

    let job = match query.wait_time_seconds {
        Some(secs) if secs > 0 => wait_for_terminal(&state, &cluster_id, &job.id, secs).await?,
        _ => job,
    };
    Ok(Json(job_view(&job)))
}

/// Fallback-poll a job until it leaves `pending`/`running`, or `secs`
/// elapses — no per-job notifier exists, so this ticks the same way the
/// queue's own long-poll loop does (`acp_queue::Queue::list_jobs`).
async fn wait_for_terminal(
    state: &ApiState,
    cluster_id: &ClusterId,
    job_id: &JobId,
    secs: u64,
) -> Result<Job, ApiError> {
    const TICK: Duration = Duration::from_millis(250);
    let deadline = Duration::from_secs(secs);
    let started = tokio::time::Instant::now();
    loop {
        let job = state
            .store
            .with_state(|s| s.get_job(cluster_id, job_id).cloned())
            .ok_or_else(|| ApiError::NotFound(format!("job {job_id} not found")))?;
        if job.status.is_terminal() || started.elapsed() >= deadline {
            return Ok(job);
        }
        sleep(TICK.min(deadline.saturating_sub(started.elapsed()))).await;
    }
}

#[derive(Debug, Deserialize)]
pub struct ListJobsQuery {
    pub tools: String,
    #[serde(rename = "machineId")]
    pub machine_id: String,
    #[serde(default)]
    pub acknowledge: bool,
    #[serde(rename = "waitTime", default)]
    pub wait_time_seconds: u64,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(rename = "ip", default)]
    pub ip: Option<String>,
    #[serde(rename = "sdkVersion", default)]
    pub sdk_version: Option<String>,
    #[serde(rename = "sdkLanguage", default)]
    pub sdk_language: Option<String>,
}

fn default_limit() -> usize {
    10
}

pub async fn list_jobs(
    State(state): State<ApiState>,
    Path(cluster_id): Path<String>,
    Query(query): Query<ListJobsQuery>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let req = ListJobsRequest {
        cluster_id: ClusterId::new(cluster_id),
        machine_id: MachineId::new(query.machine_id),
        heartbeat: MachineHeartbeat {
            ip: query.ip,
            sdk_version: query.sdk_version,
            sdk_language: query.sdk_language,
        },
        tools: query.tools.split(',').filter(|s| !s.is_empty()).map(ToolName::new).collect(),
        limit: query.limit,
        wait_time_seconds: query.wait_time_seconds,
        acknowledge: query.acknowledge,
    };
    let now = move || {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    };
    let jobs = state.queue.list_jobs(req, now).await?;
    Ok(Json(jobs.iter().map(job_view).collect()))
}

pub async fn get_job(
    State(state): State<ApiState>,
    Path((cluster_id, job_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let cluster_id = ClusterId::new(cluster_id);
    let job_id = JobId::new(job_id);
    let job = state
        .store
        .with_state(|s| s.get_job(&cluster_id, &job_id).cloned())
        .ok_or_else(|| ApiError::NotFound(format!("job {job_id} not found")))?;
    Ok(Json(job_view(&job)))
}

#[derive(Debug, Deserialize)]
pub struct SubmitResultBody {
    #[serde(rename = "machineId")]
    pub machine_id: String,
    #[serde(rename = "resultType")]
    pub result_type: ResultType,
    pub result: Value,
}

pub async fn submit_result(
    State(state): State<ApiState>,
    Path((cluster_id, job_id)): Path<(String, String)>,
    Json(body): Json<SubmitResultBody>,
) -> Result<Json<Value>, ApiError> {
    let cluster_id = ClusterId::new(cluster_id);
    let job_id = JobId::new(job_id);
    let now_ms = state.now_ms();
    let job = state.queue.create_job_result(
        cluster_id.clone(),
        job_id,
        &body.machine_id,
        body.result_type,
        body.result,
        now_ms,
        &state.id_gen,
    )?;

    if let Some(run_id) = job.run_id.clone() {
        state.agent_engine.notify_job_result(cluster_id, run_id, now_ms, &state.id_gen).await?;
    }

    Ok(Json(job_view(&job)))
}

#[derive(Debug, Deserialize)]
pub struct ApprovalBody {
    pub approved: bool,
}

pub async fn approval(
    State(state): State<ApiState>,
    Path((cluster_id, job_id)): Path<(String, String)>,
    Json(body): Json<ApprovalBody>,
) -> Result<Json<Value>, ApiError> {
    let cluster_id = ClusterId::new(cluster_id);
    let job_id = JobId::new(job_id);
    let job = if body.approved {
        state.queue.approve_job(cluster_id, job_id)?
    } else {
        state.queue.reject_job(cluster_id, job_id)?
    };
    Ok(Json(job_view(&job)))
}

fn job_view(job: &Job) -> Value {
    serde_json::json!({
        "id": job.id,
        "clusterId": job.cluster_id,
        "runId": job.run_id,
        "workflowExecutionId": job.workflow_execution_id,
        "targetFn": job.target_fn,
        "targetArgs": job.target_args,
        "status": job.status,
        "resultType": job.result_type,
        "result": job.result,
        "approved": job.approved,
        "approvalRequested": job.approval_requested,
        "createdAt": job.created_at_ms,
        "executingMachineId": job.executing_machine_id,
        "attempts": job.attempts,
        "maxAttempts": job.max_attempts,
    })
}
