// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`Dispatcher`]: delivers `onStatusChange` notifications for runs that
//! have transitioned into one of their configured statuses (spec §4.6).
//!
//! Sweep-based rather than event-subscribed: every `sweep()` call scans
//! [`acp_store::MaterializedState::runs_needing_dispatch`] for runs whose
//! current status hasn't been delivered yet, delivers each, then marks it
//! dispatched. A crash between delivery and the mark just means the next
//! sweep redelivers — matching the at-least-once guarantee spec §4.6
//! documents, the same way the stall reaper's sweep tolerates a missed tick.

use crate::error::DispatchError;
use crate::retry::RetryPolicy;
use crate::webhook;
use acp_core::{IdGen, JobConfig, JobId, OnStatusChange, Run, ToolConfig};
use acp_queue::Queue;
use acp_store::Store;
use acp_workflow::WorkflowEngine;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

pub struct Dispatcher<G: IdGen + 'static> {
    store: Store,
    queue: Arc<Queue>,
    workflow_engine: Arc<WorkflowEngine>,
    http: reqwest::Client,
    webhook_retry: RetryPolicy,
    id_gen: G,
}

fn run_summary(run: &Run) -> Value {
    json!({
        "id": run.id.as_str(),
        "status": run.status.to_string(),
        "result": run.result,
        "failureReason": run.failure_reason,
    })
}

impl<G: IdGen + Clone + 'static> Dispatcher<G> {
    pub fn new(
        store: Store,
        queue: Arc<Queue>,
        workflow_engine: Arc<WorkflowEngine>,
        id_gen: G,
    ) -> Self {
        Self { store, queue, workflow_engine, http: reqwest::Client::new(), webhook_retry: RetryPolicy::default(), id_gen }
    }

    /// Deliver every run's pending `onStatusChange` target. Returns the
    /// number delivered. Individual delivery failures are logged and
    /// skipped rather than aborting the sweep — a stuck webhook must not
    /// block other runs' notifications.
    pub async fn sweep(&self, now_ms: u64) -> usize {
        let runs = self.store.with_state(|s| s.runs_needing_dispatch());
        let mut delivered = 0;
        for run in runs {
            match self.deliver(&run, now_ms).await {
                Ok(()) => {
                    if let Err(err) = self.store.apply(acp_store::Op::RunStatusChangeDispatched {
                        cluster_id: run.cluster_id.clone(),
                        run_id: run.id.clone(),
                    }) {
                        warn!(run_id = %run.id, %err, "failed to record dispatch");
                        continue;
                    }
                    delivered += 1;
                }
                Err(err) => warn!(run_id = %run.id, %err, "onStatusChange delivery failed"),
            }
        }
        delivered
    }

    async fn deliver(&self, run: &Run, now_ms: u64) -> Result<(), DispatchError> {
        let Some(target) = &run.on_status_change else { return Ok(()) };
        let summary = run_summary(run);
        match target {
            OnStatusChange::Tool { tool_name, .. } => {
                self.enqueue_job(run, tool_name, summary, now_ms)?;
            }
            OnStatusChange::Function { function_name, .. } => {
                self.enqueue_job(run, function_name, summary, now_ms)?;
            }
            OnStatusChange::Webhook { url, .. } => {
                webhook::deliver(&self.http, url, &summary, &self.webhook_retry).await?;
            }
            OnStatusChange::Workflow { execution_id, .. } => {
                let exec = self
                    .store
                    .with_state(|s| s.get_workflow_execution(execution_id).cloned())
                    .ok_or_else(|| DispatchError::WorkflowExecutionNotFound(execution_id.as_str().to_string()))?;
                self.workflow_engine
                    .drive(
                        run.cluster_id.clone(),
                        exec.name.clone(),
                        exec.version,
                        execution_id.clone(),
                        now_ms,
                        &self.id_gen,
                    )
                    .await?;
            }
        }
        Ok(())
    }

    /// `function`/`tool` delivery is the same operation either way (spec
    /// §4.6): enqueue a job in the run's cluster targeting the configured
    /// name, with the run summary as input.
    fn enqueue_job(&self, run: &Run, target_fn: &str, summary: Value, now_ms: u64) -> Result<(), DispatchError> {
        let config = JobConfig {
            cluster_id: run.cluster_id.clone(),
            run_id: Some(run.id.clone()),
            workflow_execution_id: run.workflow_execution_id.clone(),
            target_fn: target_fn.to_string(),
            target_args: summary,
            tool_config: ToolConfig::default(),
            cache_key: None,
            auth_context: None,
            run_context: None,
        };
        self.queue.create_job(JobId::new(self.id_gen.next()), config, now_ms)?;
        Ok(())
    }
}

/// Spawn the dispatch sweep as a cancellable background task, matching
/// `acp_queue::spawn_stall_reaper`'s shape.
pub fn spawn_dispatch_worker<G: IdGen + Clone + 'static>(
    dispatcher: Arc<Dispatcher<G>>,
    cadence: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cadence);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("status-change dispatcher shutting down");
                    return;
                }
                _ = interval.tick() => {
                    let now_ms = std::time::SystemTime::now()
                        .duration_since(std::time::UNIX_EPOCH)
                        .unwrap_or_default()
                        .as_millis() as u64;
                    let delivered = dispatcher.sweep(now_ms).await;
                    if delivered > 0 {
                        tracing::debug!(delivered, "status-change dispatcher sweep");
                    }
                }
            }
        }
    })
}
