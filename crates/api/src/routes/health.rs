// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /live`, `GET /health` — unauthenticated, added after the auth layer
//! (spec §6 supplementary).

use crate::state::ApiState;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

pub async fn live() -> &'static str {
    "ok"
}

pub async fn health(State(state): State<ApiState>) -> Json<Value> {
    Json(json!({"status": "ok", "now": state.now_ms()}))
}
