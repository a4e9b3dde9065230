// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `PUT/GET /clusters/:c/keys/:key`: the externally-addressable cluster
//! MemoKV (spec §3, §6) — distinct from workflow `memo()` cells, which are
//! scoped to a single execution.

use crate::error::ApiError;
use crate::state::ApiState;
use acp_core::{ClusterId, MemoConflictPolicy, MemoValue};
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct PutKeyBody {
    pub value: Value,
    #[serde(rename = "onConflict", default)]
    pub on_conflict: MemoConflictPolicy,
}

pub async fn put_key(
    State(state): State<ApiState>,
    Path((cluster_id, key)): Path<(String, String)>,
    Json(body): Json<PutKeyBody>,
) -> Result<Json<Value>, ApiError> {
    let cluster_id = ClusterId::new(cluster_id);
    let value = MemoValue::new(body.value);
    state.store.apply(acp_store::Op::ClusterKeyValueSet {
        cluster_id: cluster_id.clone(),
        key: key.clone(),
        value,
        policy: body.on_conflict,
    })?;
    let stored = state
        .store
        .with_state(|s| s.get_cluster_kv(&cluster_id, &key).cloned())
        .ok_or_else(|| ApiError::NotFound(format!("key {key} not found")))?;
    Ok(Json(serde_json::json!({"key": key, "value": stored.value})))
}

pub async fn get_key(
    State(state): State<ApiState>,
    Path((cluster_id, key)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let cluster_id = ClusterId::new(cluster_id);
    let stored = state
        .store
        .with_state(|s| s.get_cluster_kv(&cluster_id, &key).cloned())
        .ok_or_else(|| ApiError::NotFound(format!("key {key} not found")))?;
    Ok(Json(serde_json::json!({"key": key, "value": stored.value})))
}
