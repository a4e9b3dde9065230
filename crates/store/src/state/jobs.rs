// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job lifecycle handlers.

use super::MaterializedState;
use crate::op::Op;
use acp_core::{ClusterId, Event, EventType, JobId};

pub(super) fn apply(state: &mut MaterializedState, op: &Op) {
    match op {
        Op::JobCreated(job) => {
            let key = (job.cluster_id.clone(), job.id.clone());
            if state.jobs.contains_key(&key) {
                return;
            }
            state.record_event(
                Event::new(
                    job.cluster_id.clone(),
                    EventType::JobCreated,
                    serde_json::json!({"jobId": job.id.as_str(), "targetFn": job.target_fn}),
                    job.created_at_ms,
                )
                .with_job_id(job.id.clone())
                .with_target_fn(job.target_fn.clone()),
            );
            state.jobs.insert(key, (**job).clone());
        }

        Op::JobClaimed { cluster_id, job_id, machine_id, now_ms } => {
            if let Some(job) = state.jobs.get_mut(&(cluster_id.clone(), job_id.clone())) {
                if job.is_claimable() {
                    job.claim(machine_id.as_str(), *now_ms);
                    emit_status_change(state, cluster_id, job_id, *now_ms);
                }
            }
        }

        Op::JobResolved { cluster_id, job_id, result_type, result } => {
            if let Some(job) = state.jobs.get_mut(&(cluster_id.clone(), job_id.clone())) {
                if !job.status.is_terminal() {
                    job.resolve(*result_type, result.clone());
                    let now_ms = job.created_at_ms;
                    emit_status_change(state, cluster_id, job_id, now_ms);
                }
            }
        }

        Op::JobInterrupted { cluster_id, job_id, interrupt_type, result } => {
            if let Some(job) = state.jobs.get_mut(&(cluster_id.clone(), job_id.clone())) {
                job.interrupt(*interrupt_type, result.clone());
                let now_ms = job.created_at_ms;
                emit_status_change(state, cluster_id, job_id, now_ms);
            }
        }

        Op::JobApproved { cluster_id, job_id } => {
            if let Some(job) = state.jobs.get_mut(&(cluster_id.clone(), job_id.clone())) {
                if job.approved.is_none() {
                    job.approve();
                    let now_ms = job.created_at_ms;
                    emit_status_change(state, cluster_id, job_id, now_ms);
                }
            }
        }

        Op::JobRejected { cluster_id, job_id } => {
            if let Some(job) = state.jobs.get_mut(&(cluster_id.clone(), job_id.clone())) {
                if job.approved.is_none() {
                    job.reject();
                    let now_ms = job.created_at_ms;
                    emit_status_change(state, cluster_id, job_id, now_ms);
                }
            }
        }

        Op::JobReclaimed { cluster_id, job_id } => {
            if let Some(job) = state.jobs.get_mut(&(cluster_id.clone(), job_id.clone())) {
                job.reclaim_expired();
                let now_ms = job.created_at_ms;
                emit_status_change(state, cluster_id, job_id, now_ms);
            }
        }

        _ => {}
    }
}

fn emit_status_change(
    state: &mut MaterializedState,
    cluster_id: &ClusterId,
    job_id: &JobId,
    now_ms: u64,
) {
    let Some(job) = state.jobs.get(&(cluster_id.clone(), job_id.clone())) else { return };
    let status = job.status.to_string();
    state.record_event(
        Event::new(
            cluster_id.clone(),
            EventType::JobStatusChanged,
            serde_json::json!({"jobId": job_id.as_str(), "status": status}),
            now_ms,
        )
        .with_job_id(job_id.clone())
        .with_status(status),
    );
}

