// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `POST /machines` (spec §6 `createMachine`, §4.3).

use crate::error::ApiError;
use crate::state::ApiState;
use acp_core::{ClusterId, MachineId};
use acp_registry::{MachineHeartbeat, ToolDeclaration};
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct ToolDeclarationBody {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub schema: Option<Value>,
    #[serde(default)]
    pub config: acp_core::ToolConfig,
}

#[derive(Debug, Deserialize)]
pub struct UpsertMachineBody {
    #[serde(rename = "clusterId")]
    pub cluster_id: String,
    #[serde(rename = "machineId")]
    pub machine_id: String,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(rename = "sdkVersion", default)]
    pub sdk_version: Option<String>,
    #[serde(rename = "sdkLanguage", default)]
    pub sdk_language: Option<String>,
    #[serde(default)]
    pub tools: Vec<ToolDeclarationBody>,
}

pub async fn upsert_machine(
    State(state): State<ApiState>,
    Json(body): Json<UpsertMachineBody>,
) -> Result<Json<Value>, ApiError> {
    let cluster_id = ClusterId::new(body.cluster_id);
    let machine_id = MachineId::new(body.machine_id);
    let now_ms = state.now_ms();

    let tools: Vec<ToolDeclaration> = body
        .tools
        .into_iter()
        .map(|t| ToolDeclaration {
            name: acp_core::ToolName::new(t.name),
            description: t.description,
            schema: t.schema.map(acp_core::SchemaIr::new),
            config: t.config,
        })
        .collect();

    let heartbeat = MachineHeartbeat { ip: body.ip, sdk_version: body.sdk_version, sdk_language: body.sdk_language };
    let machine = state.registry().heartbeat(cluster_id, machine_id, heartbeat, &tools, now_ms)?;

    Ok(Json(serde_json::json!({
        "clusterId": machine.cluster_id,
        "id": machine.id,
        "lastPingAt": machine.last_ping_at_ms,
        "status": machine.status,
    })))
}
