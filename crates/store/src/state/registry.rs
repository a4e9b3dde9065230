// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster/machine/tool upsert handlers.

use super::MaterializedState;
use crate::op::Op;
use acp_core::{Event, EventType};

pub(super) fn apply(state: &mut MaterializedState, op: &Op) {
    match op {
        Op::ClusterUpserted(cluster) => {
            state.clusters.insert(cluster.id.clone(), cluster.clone());
        }

        Op::MachineUpserted(machine) => {
            let key = (machine.cluster_id.clone(), machine.id.clone());
            let is_new = !state.machines.contains_key(&key);
            state.machines.insert(key, machine.clone());
            if is_new {
                state.record_event(
                    Event::new(
                        machine.cluster_id.clone(),
                        EventType::MachinePing,
                        serde_json::json!({"machineId": machine.id.as_str()}),
                        machine.last_ping_at_ms,
                    )
                    .with_machine_id(machine.id.clone()),
                );
            }
        }

        Op::ToolUpserted(tool) => {
            let key = (tool.cluster_id.clone(), tool.name.clone());
            state.tools.insert(key, tool.clone());
            state.record_event(Event::new(
                tool.cluster_id.clone(),
                EventType::ToolUpserted,
                serde_json::json!({"toolName": tool.name.as_str()}),
                tool.created_at_ms,
            ));
        }

        _ => {}
    }
}
