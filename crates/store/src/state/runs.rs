// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run lifecycle handlers.

use super::MaterializedState;
use crate::op::Op;
use acp_core::{ClusterId, Event, EventType, RunId, RunStatus};

pub(super) fn apply(state: &mut MaterializedState, op: &Op) {
    match op {
        Op::RunCreated(run) => {
            let key = (run.cluster_id.clone(), run.id.clone());
            if state.runs.contains_key(&key) {
                return;
            }
            state.runs.insert(key, (**run).clone());
        }

        Op::RunStarted { cluster_id, run_id } => {
            with_run_mut(state, cluster_id, run_id, |r| r.status == RunStatus::Pending, |r| {
                r.start()
            });
        }

        Op::RunPaused { cluster_id, run_id } => {
            with_run_mut(state, cluster_id, run_id, |r| r.status == RunStatus::Running, |r| {
                r.pause()
            });
        }

        Op::RunResumed { cluster_id, run_id } => {
            with_run_mut(state, cluster_id, run_id, |r| r.status == RunStatus::Paused, |r| {
                r.resume()
            });
        }

        Op::RunFinished { cluster_id, run_id, result } => {
            let result = result.clone();
            with_run_mut(
                state,
                cluster_id,
                run_id,
                |r| !r.status.is_terminal(),
                move |r| r.finish(result),
            );
        }

        Op::RunFailed { cluster_id, run_id, reason } => {
            let reason = reason.clone();
            with_run_mut(
                state,
                cluster_id,
                run_id,
                |r| !r.status.is_terminal(),
                move |r| r.fail(reason),
            );
        }

        Op::RunOnStatusChangeSet { cluster_id, run_id, on_status_change } => {
            let on_status_change = on_status_change.clone();
            if let Some(run) = state.runs.get_mut(&(cluster_id.clone(), run_id.clone())) {
                run.on_status_change = on_status_change;
            }
        }

        Op::RunStatusChangeDispatched { cluster_id, run_id } => {
            if let Some(run) = state.runs.get_mut(&(cluster_id.clone(), run_id.clone())) {
                run.mark_dispatched();
            }
        }

        _ => {}
    }
}

fn with_run_mut(
    state: &mut MaterializedState,
    cluster_id: &ClusterId,
    run_id: &RunId,
    guard: impl FnOnce(&acp_core::Run) -> bool,
    mutate: impl FnOnce(&mut acp_core::Run),
) {
    let key = (cluster_id.clone(), run_id.clone());
    let Some(run) = state.runs.get_mut(&key) else { return };
    if !guard(run) {
        return;
    }
    mutate(run);
    let status = run.status.to_string();
    let now_ms = run.created_at_ms;
    state.record_event(
        Event::new(
            cluster_id.clone(),
            EventType::RunStatusChanged,
            serde_json::json!({"runId": run_id.as_str(), "status": status}),
            now_ms,
        )
        .with_run_id(run_id.clone())
        .with_status(status),
    );
}
