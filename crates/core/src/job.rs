// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job: a single invocation of a tool with durable state (spec §3, §4.2).

use crate::auth::AuthContext;
use crate::cluster::ClusterId;
use crate::run::RunId;
use crate::tool::ToolConfig;
use crate::workflow_execution::WorkflowExecutionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

crate::define_string_id! {
    /// Job identifier. May be caller-supplied (idempotent create) or
    /// server-generated.
    pub struct JobId;
}

/// Default lease length when a tool declares no `timeoutSeconds`.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Success,
    Failure,
    Stalled,
    Interrupted,
}

crate::simple_display! {
    JobStatus {
        Pending => "pending",
        Running => "running",
        Success => "success",
        Failure => "failure",
        Stalled => "stalled",
        Interrupted => "interrupted",
    }
}

impl JobStatus {
    /// `status ∈ {success, failure, interrupted}` per §3 is where `result`
    /// and `resultType` freeze, though `interrupted` is only terminal for
    /// `general` interrupts — an `approval` interrupt still transitions on
    /// to `pending`/`failure`. Callers that need the strict "never changes
    /// again" set should match on `Success | Failure` directly.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failure)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
    Resolution,
    Rejection,
    Interrupt,
}

crate::simple_display! {
    ResultType {
        Resolution => "resolution",
        Rejection => "rejection",
        Interrupt => "interrupt",
    }
}

/// Inputs needed to create a new job.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub cluster_id: ClusterId,
    pub run_id: Option<RunId>,
    pub workflow_execution_id: Option<WorkflowExecutionId>,
    pub target_fn: String,
    pub target_args: Value,
    pub tool_config: ToolConfig,
    pub cache_key: Option<String>,
    pub auth_context: Option<AuthContext>,
    pub run_context: Option<Value>,
}

/// A single tool invocation and its durable lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub cluster_id: ClusterId,
    pub run_id: Option<RunId>,
    pub workflow_execution_id: Option<WorkflowExecutionId>,
    pub target_fn: String,
    pub target_args: Value,
    pub status: JobStatus,
    pub result_type: Option<ResultType>,
    pub result: Option<Value>,
    pub approved: Option<bool>,
    #[serde(default)]
    pub approval_requested: bool,
    pub created_at_ms: u64,
    pub executing_machine_id: Option<String>,
    pub lease_expires_at_ms: Option<u64>,
    #[serde(default)]
    pub attempts: u32,
    pub max_attempts: u32,
    pub cache_key: Option<String>,
    pub timeout_seconds: u64,
    pub auth_context: Option<AuthContext>,
    pub run_context: Option<Value>,
}

impl Job {
    pub fn new(id: JobId, config: JobConfig, now_ms: u64) -> Self {
        let timeout_seconds = config.tool_config.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS);
        Self {
            id,
            cluster_id: config.cluster_id,
            run_id: config.run_id,
            workflow_execution_id: config.workflow_execution_id,
            target_fn: config.target_fn,
            target_args: config.target_args,
            status: JobStatus::Pending,
            result_type: None,
            result: None,
            approved: None,
            approval_requested: false,
            created_at_ms: now_ms,
            executing_machine_id: None,
            lease_expires_at_ms: None,
            attempts: 0,
            max_attempts: config.tool_config.max_attempts(),
            cache_key: config.cache_key,
            timeout_seconds,
            auth_context: config.auth_context,
            run_context: config.run_context,
        }
    }

    pub fn is_claimable(&self) -> bool {
        self.status == JobStatus::Pending
    }

    /// Claim the job for `machine_id`, bumping `attempts` and arming the
    /// lease (spec §4.2 step 2).
    pub fn claim(&mut self, machine_id: impl Into<String>, now_ms: u64) {
        self.status = JobStatus::Running;
        self.executing_machine_id = Some(machine_id.into());
        self.attempts += 1;
        self.lease_expires_at_ms = Some(now_ms + self.timeout_seconds * 1000);
    }

    /// True if `candidate_machine_id` currently holds the lease on a
    /// running job (spec §4.2: "valid only if ... leaseholder").
    pub fn is_leaseholder(&self, candidate_machine_id: &str) -> bool {
        self.status == JobStatus::Running
            && self.executing_machine_id.as_deref() == Some(candidate_machine_id)
    }

    /// Freeze a terminal resolution/rejection result.
    pub fn resolve(&mut self, result_type: ResultType, result: Value) {
        debug_assert!(matches!(result_type, ResultType::Resolution | ResultType::Rejection));
        self.status = match result_type {
            ResultType::Resolution => JobStatus::Success,
            ResultType::Rejection | ResultType::Interrupt => JobStatus::Failure,
        };
        self.result_type = Some(result_type);
        self.result = Some(result);
        self.executing_machine_id = None;
        self.lease_expires_at_ms = None;
    }

    /// Record an interrupt result (spec §4.2 `resultType=interrupt`).
    pub fn interrupt(&mut self, interrupt_type: crate::interrupt::InterruptType, result: Value) {
        self.status = JobStatus::Interrupted;
        self.result_type = Some(ResultType::Interrupt);
        self.result = Some(result);
        self.approval_requested = interrupt_type == crate::interrupt::InterruptType::Approval;
    }

    /// True if the lease has expired while still `running`.
    pub fn lease_expired(&self, now_ms: u64) -> bool {
        match (self.status, self.lease_expires_at_ms) {
            (JobStatus::Running, Some(expires_at)) => now_ms > expires_at,
            (JobStatus::Running, None) => true,
            _ => false,
        }
    }

    /// Apply the stall/retry rule (spec §4.2): re-queue if attempts remain,
    /// else fail terminally with reason `stalled`.
    pub fn reclaim_expired(&mut self) {
        debug_assert!(self.status == JobStatus::Running);
        self.executing_machine_id = None;
        self.lease_expires_at_ms = None;
        if self.attempts < self.max_attempts {
            self.status = JobStatus::Pending;
        } else {
            self.status = JobStatus::Failure;
            self.result_type = Some(ResultType::Rejection);
            self.result = Some(serde_json::json!({"reason": "stalled"}));
        }
    }

    /// Approval grant: `interrupted -> pending`, preserving `attempts`
    /// (spec: "the approval is not an attempt").
    pub fn approve(&mut self) {
        debug_assert!(self.status == JobStatus::Interrupted && self.approval_requested);
        self.approved = Some(true);
        self.status = JobStatus::Pending;
        self.approval_requested = false;
    }

    /// Approval rejection: terminal failure.
    pub fn reject(&mut self) {
        debug_assert!(self.status == JobStatus::Interrupted && self.approval_requested);
        self.approved = Some(false);
        self.status = JobStatus::Failure;
        self.result_type = Some(ResultType::Rejection);
        self.result = Some(serde_json::json!({"reason": "approval_rejected"}));
        self.approval_requested = false;
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Job {
    pub fn test_fixture(cluster_id: impl Into<ClusterId>, target_fn: impl Into<String>) -> Self {
        Job::new(
            JobId::new("job_test"),
            JobConfig {
                cluster_id: cluster_id.into(),
                run_id: None,
                workflow_execution_id: None,
                target_fn: target_fn.into(),
                target_args: Value::Null,
                tool_config: ToolConfig::default(),
                cache_key: None,
                auth_context: None,
                run_context: None,
            },
            0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_sets_lease_and_bumps_attempts() {
        let mut job = Job::test_fixture("cls", "echo");
        job.claim("mach_1", 1_000);
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.attempts, 1);
        assert_eq!(job.lease_expires_at_ms, Some(1_000 + DEFAULT_TIMEOUT_SECONDS * 1000));
        assert!(job.is_leaseholder("mach_1"));
        assert!(!job.is_leaseholder("mach_2"));
    }

    #[test]
    fn resolve_freezes_terminal_state() {
        let mut job = Job::test_fixture("cls", "echo");
        job.claim("mach_1", 0);
        job.resolve(ResultType::Resolution, serde_json::json!({"output": "hi"}));
        assert_eq!(job.status, JobStatus::Success);
        assert!(job.status.is_terminal());
        assert!(job.executing_machine_id.is_none());
    }

    #[test]
    fn reclaim_requeues_when_attempts_remain() {
        let mut job = Job::test_fixture("cls", "echo");
        job.max_attempts = 2;
        job.claim("mach_1", 0);
        assert!(!job.lease_expired(job.lease_expires_at_ms.unwrap() - 1));
        assert!(job.lease_expired(job.lease_expires_at_ms.unwrap() + 1));
        job.reclaim_expired();
        assert_eq!(job.status, JobStatus::Pending);
    }

    #[test]
    fn reclaim_fails_terminally_when_attempts_exhausted() {
        let mut job = Job::test_fixture("cls", "echo");
        job.max_attempts = 1;
        job.claim("mach_1", 0);
        job.reclaim_expired();
        assert_eq!(job.status, JobStatus::Failure);
        assert_eq!(job.result.as_ref().unwrap()["reason"], "stalled");
    }

    #[test]
    fn approval_grant_requeues_preserving_attempts() {
        let mut job = Job::test_fixture("cls", "echo");
        job.claim("mach_1", 0);
        job.interrupt(crate::interrupt::InterruptType::Approval, serde_json::json!({}));
        assert_eq!(job.status, JobStatus::Interrupted);
        let attempts_before = job.attempts;
        job.approve();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.attempts, attempts_before);
        assert_eq!(job.approved, Some(true));
    }

    #[test]
    fn approval_rejection_is_terminal_failure() {
        let mut job = Job::test_fixture("cls", "echo");
        job.claim("mach_1", 0);
        job.interrupt(crate::interrupt::InterruptType::Approval, serde_json::json!({}));
        job.reject();
        assert_eq!(job.status, JobStatus::Failure);
        assert_eq!(job.approved, Some(false));
    }
}
