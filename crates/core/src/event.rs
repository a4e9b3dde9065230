// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event: an append-only audit-log entry, keyed by `(clusterId, createdAt,
//! id)` for range scans (spec §3, §6 `GET /clusters/:cluster/events`).

use crate::cluster::ClusterId;
use crate::job::JobId;
use crate::machine::MachineId;
use crate::run::RunId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

crate::define_id! {
    /// Internally generated; never caller-supplied.
    pub struct EventId("evt-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    JobCreated,
    JobStatusChanged,
    MachinePing,
    ToolUpserted,
    RunStatusChanged,
    WorkflowExecutionStatusChanged,
}

crate::simple_display! {
    EventType {
        JobCreated => "job_created",
        JobStatusChanged => "job_status_changed",
        MachinePing => "machine_ping",
        ToolUpserted => "tool_upserted",
        RunStatusChanged => "run_status_changed",
        WorkflowExecutionStatusChanged => "workflow_execution_status_changed",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub cluster_id: ClusterId,
    pub created_at_ms: u64,
    pub event_type: EventType,
    pub job_id: Option<JobId>,
    pub machine_id: Option<MachineId>,
    pub run_id: Option<RunId>,
    pub target_fn: Option<String>,
    pub status: Option<String>,
    pub payload: Value,
}

impl Event {
    pub fn new(
        cluster_id: ClusterId,
        event_type: EventType,
        payload: Value,
        now_ms: u64,
    ) -> Self {
        Self {
            id: EventId::new(),
            cluster_id,
            created_at_ms: now_ms,
            event_type,
            job_id: None,
            machine_id: None,
            run_id: None,
            target_fn: None,
            status: None,
            payload,
        }
    }

    pub fn with_job_id(mut self, job_id: JobId) -> Self {
        self.job_id = Some(job_id);
        self
    }

    pub fn with_machine_id(mut self, machine_id: MachineId) -> Self {
        self.machine_id = Some(machine_id);
        self
    }

    pub fn with_run_id(mut self, run_id: RunId) -> Self {
        self.run_id = Some(run_id);
        self
    }

    pub fn with_target_fn(mut self, target_fn: impl Into<String>) -> Self {
        self.target_fn = Some(target_fn.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

/// Filterable attributes for `GET /clusters/:cluster/events`. `None` means
/// "don't filter on this attribute".
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub job_id: Option<JobId>,
    pub machine_id: Option<MachineId>,
    pub run_id: Option<RunId>,
    pub event_type: Option<EventType>,
    pub target_fn: Option<String>,
    pub status: Option<String>,
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(job_id) = &self.job_id {
            if event.job_id.as_ref() != Some(job_id) {
                return false;
            }
        }
        if let Some(machine_id) = &self.machine_id {
            if event.machine_id.as_ref() != Some(machine_id) {
                return false;
            }
        }
        if let Some(run_id) = &self.run_id {
            if event.run_id.as_ref() != Some(run_id) {
                return false;
            }
        }
        if let Some(event_type) = self.event_type {
            if event.event_type != event_type {
                return false;
            }
        }
        if let Some(target_fn) = &self.target_fn {
            if event.target_fn.as_deref() != Some(target_fn.as_str()) {
                return false;
            }
        }
        if let Some(status) = &self.status {
            if event.status.as_deref() != Some(status.as_str()) {
                return false;
            }
        }
        true
    }
}
