// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run: the top-level agent session an external caller starts (spec §3, §4.4).

use crate::auth::AuthContext;
use crate::cluster::ClusterId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Caller-supplied or server-generated run identifier: `^[0-9A-Za-z-_.]{4,128}$`
/// (spec §6).
crate::define_string_id! {
    pub struct RunId;
}

pub fn is_valid_run_id(id: &str) -> bool {
    id.len() >= 4
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Paused,
    Done,
    Failed,
}

crate::simple_display! {
    RunStatus {
        Pending => "pending",
        Running => "running",
        Paused => "paused",
        Done => "done",
        Failed => "failed",
    }
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Done | RunStatus::Failed)
    }
}

/// Single-step runs execute one agent turn and stop; multi-step runs loop
/// the MODEL/TOOL graph until `done` or a human message arrives (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunType {
    SingleStep,
    MultiStep,
}

crate::simple_display! {
    RunType {
        SingleStep => "single_step",
        MultiStep => "multi_step",
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub cluster_id: ClusterId,
    pub run_type: RunType,
    pub initial_prompt: Option<String>,
    pub result_schema: Option<crate::schema::SchemaIr>,
    pub on_status_change: Option<crate::status_change::OnStatusChange>,
    pub auth_context: Option<AuthContext>,
    pub additional_context: Option<Value>,
    /// Whether the run may pause awaiting a human message rather than
    /// running to completion unattended (spec §3, §4.4 pause condition).
    pub interactive: bool,
    /// Whether `invocation-result` values should be summarized with
    /// `{{id}}`-path references in the system prompt (spec §6).
    pub enable_result_grounding: bool,
    pub tags: std::collections::BTreeMap<String, String>,
    pub workflow_execution_id: Option<crate::workflow_execution::WorkflowExecutionId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub cluster_id: ClusterId,
    pub run_type: RunType,
    pub status: RunStatus,
    pub result: Option<Value>,
    pub failure_reason: Option<String>,
    pub result_schema: Option<crate::schema::SchemaIr>,
    pub on_status_change: Option<crate::status_change::OnStatusChange>,
    pub created_at_ms: u64,
    pub additional_context: Option<Value>,
    pub auth_context: Option<AuthContext>,
    pub interactive: bool,
    pub enable_result_grounding: bool,
    #[serde(default)]
    pub tags: std::collections::BTreeMap<String, String>,
    pub workflow_execution_id: Option<crate::workflow_execution::WorkflowExecutionId>,
    #[serde(default)]
    pub feedback_score: Option<i64>,
    #[serde(default)]
    pub feedback_comment: Option<String>,
    /// The status for which `onStatusChange` has already been delivered, if
    /// any — prevents the dispatcher from redelivering on every sweep once a
    /// status has fired (dispatch is at-least-once per transition, not per
    /// sweep).
    #[serde(default)]
    pub dispatched_status: Option<String>,
}

impl Run {
    pub fn new(id: RunId, config: RunConfig, now_ms: u64) -> Self {
        Self {
            id,
            cluster_id: config.cluster_id,
            run_type: config.run_type,
            status: RunStatus::Pending,
            result: None,
            failure_reason: None,
            result_schema: config.result_schema,
            on_status_change: config.on_status_change,
            created_at_ms: now_ms,
            additional_context: config.additional_context,
            auth_context: config.auth_context,
            interactive: config.interactive,
            enable_result_grounding: config.enable_result_grounding,
            tags: config.tags,
            workflow_execution_id: config.workflow_execution_id,
            feedback_score: None,
            feedback_comment: None,
            dispatched_status: None,
        }
    }

    pub fn start(&mut self) {
        debug_assert_eq!(self.status, RunStatus::Pending);
        self.status = RunStatus::Running;
    }

    pub fn pause(&mut self) {
        debug_assert_eq!(self.status, RunStatus::Running);
        self.status = RunStatus::Paused;
    }

    pub fn resume(&mut self) {
        debug_assert_eq!(self.status, RunStatus::Paused);
        self.status = RunStatus::Running;
    }

    pub fn finish(&mut self, result: Value) {
        self.status = RunStatus::Done;
        self.result = Some(result);
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        self.status = RunStatus::Failed;
        self.failure_reason = Some(reason.into());
    }

    /// Whether the current status has an `onStatusChange` target configured
    /// and delivery hasn't already been recorded for it.
    pub fn needs_dispatch(&self) -> bool {
        let Some(target) = &self.on_status_change else { return false };
        let status = self.status.to_string();
        target.fires_for(&status) && self.dispatched_status.as_deref() != Some(status.as_str())
    }

    pub fn mark_dispatched(&mut self) {
        self.dispatched_status = Some(self.status.to_string());
    }
}
