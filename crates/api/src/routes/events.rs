// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /clusters/:c/events` (spec §6 supplementary, §3 audit log).

use crate::error::ApiError;
use crate::state::ApiState;
use acp_core::{ClusterId, EventFilter, EventType, JobId, MachineId, RunId};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    #[serde(rename = "jobId", default)]
    pub job_id: Option<String>,
    #[serde(rename = "machineId", default)]
    pub machine_id: Option<String>,
    #[serde(rename = "runId", default)]
    pub run_id: Option<String>,
    #[serde(rename = "type", default)]
    pub event_type: Option<EventType>,
    #[serde(rename = "targetFn", default)]
    pub target_fn: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

pub async fn list_events(
    State(state): State<ApiState>,
    Path(cluster_id): Path<String>,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let cluster_id = ClusterId::new(cluster_id);
    let filter = EventFilter {
        job_id: query.job_id.map(JobId::new),
        machine_id: query.machine_id.map(MachineId::new),
        run_id: query.run_id.map(RunId::new),
        event_type: query.event_type,
        target_fn: query.target_fn,
        status: query.status,
    };
    let limit = query.limit;
    let events = state.store.with_state(|s| {
        s.events
            .iter()
            .filter(|e| e.cluster_id == cluster_id && filter.matches(e))
            .rev()
            .take(limit)
            .map(|e| serde_json::to_value(e).unwrap_or(Value::Null))
            .collect::<Vec<_>>()
    });
    Ok(Json(events))
}
