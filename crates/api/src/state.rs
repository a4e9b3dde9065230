// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared router state (spec §6): the handles every route needs, cloned
//! cheaply per request the way the teacher's `OrchestratorState` is.

use acp_agent::Engine as AgentEngine;
use acp_core::UuidIdGen;
use acp_queue::Queue;
use acp_registry::Registry;
use acp_store::Store;
use acp_workflow::WorkflowEngine;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Bearer/custom-auth configuration (spec §6, §7 `Environment:`).
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Compared against `Authorization: Bearer <key>` (spec's `sk_...`
    /// secret). Plain equality, matching the teacher's worker-token check —
    /// no constant-time comparison crate is in the pack's dependency stack.
    pub api_secret: String,
    /// Origins allowed by CORS outside the `/clusters/*/runs*` exception.
    pub allowed_origins: Vec<String>,
}

#[derive(Clone)]
pub struct ApiState {
    pub store: Store,
    pub queue: Arc<Queue>,
    pub agent_engine: Arc<AgentEngine>,
    pub workflow_engine: Arc<WorkflowEngine>,
    pub id_gen: UuidIdGen,
    pub config: Arc<ApiConfig>,
}

impl ApiState {
    pub fn new(
        store: Store,
        queue: Arc<Queue>,
        agent_engine: Arc<AgentEngine>,
        workflow_engine: Arc<WorkflowEngine>,
        config: ApiConfig,
    ) -> Self {
        Self { store, queue, agent_engine, workflow_engine, id_gen: UuidIdGen, config: Arc::new(config) }
    }

    /// `Registry` isn't `Clone`; it's a thin `Store` wrapper, so building one
    /// fresh per call is as cheap as cloning the `Store` handle itself
    /// (mirrors `acp_queue::Queue::new` constructing its own internally).
    pub fn registry(&self) -> Registry {
        Registry::new(self.store.clone())
    }

    pub fn now_ms(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
    }
}
