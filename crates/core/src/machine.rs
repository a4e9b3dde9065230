// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Machine: a worker process polling the control plane for jobs.
//!
//! Identified by `(clusterId, id)`; upserted on every poll but writes are
//! throttled to at most one per `(cluster, machine)` per 60s window (see
//! `acp_registry::Registry::upsert_machine`).

use serde::{Deserialize, Serialize};

crate::define_string_id! {
    /// Worker process identifier, scoped to a cluster.
    pub struct MachineId;
}

/// Liveness window: a machine is active if it polled within this long.
pub const MACHINE_LIVENESS_SECS: u64 = 60;

/// Minimum interval between persisted `last_ping_at` writes for the same
/// `(cluster, machine)` pair.
pub const MACHINE_PING_THROTTLE_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineStatus {
    Active,
    Inactive,
}

crate::simple_display! {
    MachineStatus {
        Active => "active",
        Inactive => "inactive",
    }
}

/// A worker process registered with a cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    pub cluster_id: crate::ClusterId,
    pub id: MachineId,
    pub last_ping_at_ms: u64,
    pub ip: Option<String>,
    pub sdk_version: Option<String>,
    pub sdk_language: Option<String>,
    pub status: MachineStatus,
}

impl Machine {
    pub fn new(cluster_id: crate::ClusterId, id: MachineId, now_ms: u64) -> Self {
        Self {
            cluster_id,
            id,
            last_ping_at_ms: now_ms,
            ip: None,
            sdk_version: None,
            sdk_language: None,
            status: MachineStatus::Active,
        }
    }

    /// True if this machine polled within the liveness window.
    pub fn is_live(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_ping_at_ms) < MACHINE_LIVENESS_SECS * 1000
    }

    /// True if enough time has passed since the last persisted ping that a
    /// new upsert should actually write (throttling, §3).
    pub fn should_throttle_ping(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_ping_at_ms) < MACHINE_PING_THROTTLE_SECS * 1000
    }
}
