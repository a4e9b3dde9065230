// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `onStatusChange`: a delivery target invoked when a run or workflow
//! execution transitions to one of a configured subset of statuses
//! (spec §3, §4.5). Delivery itself lives in `acp_dispatch`.

use serde::{Deserialize, Serialize};

/// The subset of terminal/interesting statuses that should trigger a
/// delivery. Validated non-empty at construction time by callers.
pub type StatusChangeTarget = Vec<String>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OnStatusChange {
    /// Invoke a registered tool by name, as an ordinary job.
    Tool { tool_name: String, statuses: StatusChangeTarget },
    /// Call a machine-hosted function directly (bypasses the job queue).
    Function { function_name: String, statuses: StatusChangeTarget },
    /// POST the status-change payload to an arbitrary URL.
    Webhook { url: String, statuses: StatusChangeTarget },
    /// Re-trigger a paused workflow execution (spec §4.5 pause/resume
    /// protocol step 2: "look up the workflow execution by `executionId`
    /// and re-trigger it").
    Workflow { execution_id: crate::WorkflowExecutionId, statuses: StatusChangeTarget },
}

impl OnStatusChange {
    pub fn statuses(&self) -> &StatusChangeTarget {
        match self {
            OnStatusChange::Tool { statuses, .. }
            | OnStatusChange::Function { statuses, .. }
            | OnStatusChange::Webhook { statuses, .. }
            | OnStatusChange::Workflow { statuses, .. } => statuses,
        }
    }

    /// Whether this target should fire for a transition into `status`.
    pub fn fires_for(&self, status: &str) -> bool {
        self.statuses().iter().any(|s| s == status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_only_for_configured_statuses() {
        let target = OnStatusChange::Webhook {
            url: "https://example.com/hook".into(),
            statuses: vec!["done".into(), "failed".into()],
        };
        assert!(target.fires_for("done"));
        assert!(target.fires_for("failed"));
        assert!(!target.fires_for("paused"));
    }
}
