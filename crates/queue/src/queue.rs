// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`Queue`]: job dispatch (spec §4.2). Wraps [`acp_store::Store`] with the
//! claim algorithm, result submission, approval cycle, and the stall
//! reaper's reclaim pass.

use crate::cache::derive_cache_key;
use crate::error::QueueError;
use crate::notifier::NotifierRegistry;
use acp_core::{
    ClusterId, IdGen, InvocationId, InvocationResultBody, Job, JobConfig, JobId, JobStatus,
    MachineId, Message, MessageId, MessageKind, ResultType, ToolName,
};
use acp_registry::{MachineHeartbeat, Registry};
use acp_store::{Op, Store};
use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;

/// Request shape for `listJobs` (spec §4.2).
#[derive(Debug, Clone)]
pub struct ListJobsRequest {
    pub cluster_id: ClusterId,
    pub machine_id: MachineId,
    pub heartbeat: MachineHeartbeat,
    pub tools: Vec<ToolName>,
    pub limit: usize,
    pub wait_time_seconds: u64,
    pub acknowledge: bool,
}

/// Fallback poll interval used while long-polling, so correctness never
/// depends on the notifier actually firing (spec §4.2 step 3).
const FALLBACK_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct Queue {
    store: Store,
    registry: Registry,
    notifiers: NotifierRegistry,
}

impl Queue {
    pub fn new(store: Store) -> Self {
        let registry = Registry::new(store.clone());
        Self { store, registry, notifiers: NotifierRegistry::new() }
    }

    pub fn wake(&self, cluster_id: &ClusterId) {
        self.notifiers.wake(cluster_id);
    }

    /// `createJob`: idempotent by caller-supplied id, and by `(clusterId,
    /// targetFn, cacheKey)` when the tool declares a cache (spec §4.2).
    pub fn create_job(&self, id: JobId, config: JobConfig, now_ms: u64) -> Result<Job, QueueError> {
        if let Some(existing) = self.store.with_state(|s| s.get_job(&config.cluster_id, &id).cloned()) {
            return Ok(existing);
        }

        let cache_key = config
            .tool_config
            .cache
            .as_ref()
            .and_then(|cache| derive_cache_key(cache, &config.target_args));

        if let Some(cache_key) = &cache_key {
            let ttl_seconds = config.tool_config.cache.as_ref().map(|c| c.ttl_seconds).unwrap_or(0);
            if let Some(existing) =
                self.find_cached_job(&config.cluster_id, &config.target_fn, cache_key, ttl_seconds, now_ms)
            {
                return Ok(existing);
            }
        }

        let mut config = config;
        config.cache_key = cache_key;
        let job = Job::new(id, config, now_ms);
        self.store.apply(Op::JobCreated(Box::new(job.clone())))?;
        self.wake(&job.cluster_id);
        Ok(job)
    }

    /// Only a terminal job created within `ttl_seconds` of `now_ms` is
    /// reused; an expired cache entry falls through to a fresh invocation
    /// (spec §8 property 3).
    fn find_cached_job(
        &self,
        cluster_id: &ClusterId,
        target_fn: &str,
        cache_key: &str,
        ttl_seconds: u64,
        now_ms: u64,
    ) -> Option<Job> {
        self.store.with_state(|s| {
            s.jobs
                .values()
                .find(|j| {
                    j.cluster_id == *cluster_id
                        && j.target_fn == target_fn
                        && j.cache_key.as_deref() == Some(cache_key)
                        && j.status.is_terminal()
                        && now_ms.saturating_sub(j.created_at_ms) < ttl_seconds * 1000
                })
                .cloned()
        })
    }

    /// `listJobs` claim algorithm (spec §4.2 steps 1-4). `now_ms` is called
    /// fresh on the initial attempt and on every retry after a wake-up or
    /// fallback-poll tick, so callers can back it with a real or fake clock.
    pub async fn list_jobs(
        &self,
        req: ListJobsRequest,
        now_ms: impl Fn() -> u64,
    ) -> Result<Vec<Job>, QueueError> {
        self.registry.heartbeat(
            req.cluster_id.clone(),
            req.machine_id.clone(),
            req.heartbeat.clone(),
            &[],
            now_ms(),
        )?;

        if !req.acknowledge {
            return Ok(Vec::new());
        }

        let claimed = self.try_claim(&req, now_ms())?;
        if !claimed.is_empty() || req.wait_time_seconds == 0 {
            return Ok(claimed);
        }

        let notify = self.notifiers.get(&req.cluster_id);
        let deadline = Duration::from_secs(req.wait_time_seconds);
        let started = tokio::time::Instant::now();

        loop {
            let remaining = deadline.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                return Ok(Vec::new());
            }
            let wait_slice = remaining.min(FALLBACK_POLL_INTERVAL);
            let _ = timeout(wait_slice, notify.notified()).await;

            let claimed = self.try_claim(&req, now_ms())?;
            if !claimed.is_empty() {
                return Ok(claimed);
            }
        }
    }

    fn try_claim(&self, req: &ListJobsRequest, now_ms: u64) -> Result<Vec<Job>, QueueError> {
        let claimed = self.store.claim_jobs(
            &req.cluster_id,
            |job| {
                req.tools.iter().any(|t| t.as_str() == job.target_fn)
                    && self.is_dispatchable(&req.cluster_id, &req.machine_id, job)
            },
            &req.machine_id,
            req.limit,
            now_ms,
        )?;
        Ok(claimed)
    }

    fn is_dispatchable(&self, cluster_id: &ClusterId, machine_id: &MachineId, job: &Job) -> bool {
        let name = ToolName::new(job.target_fn.clone());
        self.store.with_state(|s| match s.get_tool(cluster_id, &name) {
            Some(tool) => {
                !tool.config.private || tool.registered_by_machine_id.as_ref() == Some(machine_id)
            }
            None => true,
        })
    }

    /// `createJobResult` (spec §4.2). Only the leaseholder may resolve a
    /// running job.
    pub fn create_job_result(
        &self,
        cluster_id: ClusterId,
        job_id: JobId,
        machine_id: &str,
        result_type: ResultType,
        result: Value,
        now_ms: u64,
        id_gen: &impl IdGen,
    ) -> Result<Job, QueueError> {
        let job = self
            .store
            .with_state(|s| s.get_job(&cluster_id, &job_id).cloned())
            .ok_or_else(|| QueueError::JobNotFound(job_id.as_str().to_string()))?;

        if !job.is_leaseholder(machine_id) {
            return Err(QueueError::NotLeaseholder(job_id.as_str().to_string()));
        }

        match result_type {
            ResultType::Resolution | ResultType::Rejection => {
                self.store.apply(Op::JobResolved {
                    cluster_id: cluster_id.clone(),
                    job_id: job_id.clone(),
                    result_type,
                    result: result.clone(),
                })?;
                if let Some(run_id) = &job.run_id {
                    let message = Message::new(
                        MessageId::generate(now_ms, id_gen),
                        run_id.clone(),
                        now_ms,
                        MessageKind::InvocationResult(InvocationResultBody {
                            invocation_id: InvocationId::new(job_id.as_str()),
                            tool_name: job.target_fn.clone(),
                            result_type,
                            result,
                        }),
                    );
                    self.store.apply(Op::MessageAppended(Box::new(message)))?;
                }
            }
            ResultType::Interrupt => {
                let interrupt_type = acp_core::InterruptPayload::from_result(&result)
                    .map(|p| p.kind)
                    .unwrap_or(acp_core::InterruptType::General);
                self.store.apply(Op::JobInterrupted {
                    cluster_id: cluster_id.clone(),
                    job_id: job_id.clone(),
                    interrupt_type,
                    result,
                })?;
            }
        }

        self.wake(&cluster_id);
        self.store
            .with_state(|s| s.get_job(&cluster_id, &job_id).cloned())
            .ok_or_else(|| QueueError::JobNotFound(job_id.as_str().to_string()))
    }

    /// Grant a pending approval interrupt: `interrupted -> pending`.
    pub fn approve_job(&self, cluster_id: ClusterId, job_id: JobId) -> Result<Job, QueueError> {
        self.store.apply(Op::JobApproved { cluster_id: cluster_id.clone(), job_id: job_id.clone() })?;
        self.wake(&cluster_id);
        self.store
            .with_state(|s| s.get_job(&cluster_id, &job_id).cloned())
            .ok_or_else(|| QueueError::JobNotFound(job_id.as_str().to_string()))
    }

    /// Reject a pending approval interrupt: terminal failure.
    pub fn reject_job(&self, cluster_id: ClusterId, job_id: JobId) -> Result<Job, QueueError> {
        self.store.apply(Op::JobRejected { cluster_id: cluster_id.clone(), job_id: job_id.clone() })?;
        self.wake(&cluster_id);
        self.store
            .with_state(|s| s.get_job(&cluster_id, &job_id).cloned())
            .ok_or_else(|| QueueError::JobNotFound(job_id.as_str().to_string()))
    }

    /// Stall reaper sweep (spec §4.2 "Retry / stall"): reclaim every
    /// `running` job whose lease has expired. Returns the number reclaimed.
    pub fn reap_stalled(&self, now_ms: u64) -> Result<usize, QueueError> {
        let expired: Vec<(ClusterId, JobId)> = self.store.with_state(|s| {
            s.jobs
                .values()
                .filter(|j| j.status == JobStatus::Running && j.lease_expired(now_ms))
                .map(|j| (j.cluster_id.clone(), j.id.clone()))
                .collect()
        });

        let mut woken = std::collections::HashSet::new();
        for (cluster_id, job_id) in &expired {
            self.store.apply(Op::JobReclaimed { cluster_id: cluster_id.clone(), job_id: job_id.clone() })?;
            woken.insert(cluster_id.clone());
        }
        for cluster_id in woken {
            self.wake(&cluster_id);
        }
        Ok(expired.len())
    }
}
