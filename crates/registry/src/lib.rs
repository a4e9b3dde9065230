// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! acp-registry: machine heartbeats and tool definitions (spec §4.3).
//!
//! A machine's heartbeat (`createMachine`) both upserts the `Machine` record
//! (throttled to one persisted write per liveness window) and registers the
//! tools it declares as expiring, liveness-tied-to-polling `Tool` records.
//! Persistent tool declarations (e.g. a workflow's tool) go through
//! [`Registry::declare_tool`] instead and never expire.

pub mod error;

pub use error::RegistryError;

use acp_core::{
    is_valid_tool_name, Cluster, ClusterId, Machine, MachineId, SchemaIr, Tool, ToolConfig,
    ToolName,
};
use acp_store::{Op, Store};

/// A tool a machine declares it can run, supplied on every `createMachine`
/// heartbeat alongside `(ip, sdkVersion, sdkLanguage)`.
#[derive(Debug, Clone)]
pub struct ToolDeclaration {
    pub name: ToolName,
    pub description: Option<String>,
    pub schema: Option<SchemaIr>,
    pub config: ToolConfig,
}

#[derive(Debug, Clone, Default)]
pub struct MachineHeartbeat {
    pub ip: Option<String>,
    pub sdk_version: Option<String>,
    pub sdk_language: Option<String>,
}

pub struct Registry {
    store: Store,
}

impl Registry {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn upsert_cluster(&self, cluster: Cluster) -> Result<(), RegistryError> {
        self.store.apply(Op::ClusterUpserted(cluster))?;
        Ok(())
    }

    /// Heartbeat a machine and its declared tools (spec §4.3). Returns the
    /// machine record as of this call (whether or not a write occurred).
    pub fn heartbeat(
        &self,
        cluster_id: ClusterId,
        machine_id: MachineId,
        heartbeat: MachineHeartbeat,
        tools: &[ToolDeclaration],
        now_ms: u64,
    ) -> Result<Machine, RegistryError> {
        for tool in tools {
            if !is_valid_tool_name(tool.name.as_str()) {
                return Err(RegistryError::InvalidToolName(tool.name.as_str().to_string()));
            }
        }

        let existing =
            self.store.with_state(|s| s.get_machine(&cluster_id, &machine_id).cloned());
        let machine = match &existing {
            Some(m) if m.should_throttle_ping(now_ms) => m.clone(),
            _ => {
                let mut machine = existing.unwrap_or_else(|| {
                    Machine::new(cluster_id.clone(), machine_id.clone(), now_ms)
                });
                machine.last_ping_at_ms = now_ms;
                machine.ip = heartbeat.ip.or(machine.ip);
                machine.sdk_version = heartbeat.sdk_version.or(machine.sdk_version);
                machine.sdk_language = heartbeat.sdk_language.or(machine.sdk_language);
                self.store.apply(Op::MachineUpserted(machine.clone()))?;
                machine
            }
        };

        for decl in tools {
            self.upsert_machine_tool(&cluster_id, &machine_id, decl, now_ms)?;
        }

        Ok(machine)
    }

    fn upsert_machine_tool(
        &self,
        cluster_id: &ClusterId,
        machine_id: &MachineId,
        decl: &ToolDeclaration,
        now_ms: u64,
    ) -> Result<(), RegistryError> {
        let mut tool = self
            .store
            .with_state(|s| s.get_tool(cluster_id, &decl.name).cloned())
            .unwrap_or_else(|| Tool::new(cluster_id.clone(), decl.name.clone(), now_ms));
        tool.description = decl.description.clone().or(tool.description);
        tool.schema = decl.schema.clone().or(tool.schema);
        tool.config = decl.config.clone();
        tool.should_expire = true;
        tool.last_ping_at_ms = Some(now_ms);
        tool.registered_by_machine_id = Some(machine_id.clone());
        self.store.apply(Op::ToolUpserted(tool))?;
        Ok(())
    }

    /// Register a persistent, non-expiring tool declaration (e.g. a
    /// workflow's private tool). Never touched by heartbeat throttling.
    pub fn declare_tool(
        &self,
        cluster_id: ClusterId,
        name: ToolName,
        description: Option<String>,
        schema: Option<SchemaIr>,
        config: ToolConfig,
        now_ms: u64,
    ) -> Result<Tool, RegistryError> {
        if !is_valid_tool_name(name.as_str()) {
            return Err(RegistryError::InvalidToolName(name.as_str().to_string()));
        }
        let mut tool = self
            .store
            .with_state(|s| s.get_tool(&cluster_id, &name).cloned())
            .unwrap_or_else(|| Tool::new(cluster_id.clone(), name.clone(), now_ms));
        tool.description = description.or(tool.description);
        tool.schema = schema.or(tool.schema);
        tool.config = config;
        tool.should_expire = false;
        self.store.apply(Op::ToolUpserted(tool.clone()))?;
        Ok(tool)
    }

    /// True if the named tool exists and is currently callable (spec §4.3
    /// liveness rule).
    pub fn is_tool_callable(&self, cluster_id: &ClusterId, name: &ToolName, now_ms: u64) -> bool {
        self.store
            .with_state(|s| s.get_tool(cluster_id, name).map(|t| t.is_live(now_ms)))
            .unwrap_or(false)
    }

    /// Tools a run (optionally scoped to `machine_id` for private-tool
    /// dispatch) may currently call: live or non-expiring, and — for
    /// `config.private` tools — registered by `machine_id`.
    pub fn callable_tools(
        &self,
        cluster_id: &ClusterId,
        machine_id: Option<&MachineId>,
        now_ms: u64,
    ) -> Vec<Tool> {
        self.store.with_state(|s| {
            s.tools
                .values()
                .filter(|t| t.cluster_id == *cluster_id)
                .filter(|t| t.is_live(now_ms))
                .filter(|t| {
                    !t.config.private
                        || t.registered_by_machine_id.as_ref() == machine_id
                })
                .cloned()
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acp_core::ClusterId;

    fn tool_decl(name: &str, private: bool) -> ToolDeclaration {
        ToolDeclaration {
            name: ToolName::new(name),
            description: None,
            schema: None,
            config: ToolConfig { private, ..Default::default() },
        }
    }

    #[test]
    fn heartbeat_registers_machine_and_tools() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let registry = Registry::new(store);
        let cluster_id = ClusterId::new("cls");
        let machine_id = MachineId::new("mch_1");

        registry
            .heartbeat(
                cluster_id.clone(),
                machine_id.clone(),
                MachineHeartbeat::default(),
                &[tool_decl("echo", false)],
                1_000,
            )
            .unwrap();

        assert!(registry.is_tool_callable(&cluster_id, &ToolName::new("echo"), 1_000));
    }

    #[test]
    fn heartbeat_throttles_repeated_writes_within_window() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let registry = Registry::new(store.clone());
        let cluster_id = ClusterId::new("cls");
        let machine_id = MachineId::new("mch_1");

        registry
            .heartbeat(cluster_id.clone(), machine_id.clone(), MachineHeartbeat::default(), &[], 0)
            .unwrap();
        registry
            .heartbeat(
                cluster_id.clone(),
                machine_id.clone(),
                MachineHeartbeat::default(),
                &[],
                30_000,
            )
            .unwrap();

        let machine = store.with_state(|s| s.get_machine(&cluster_id, &machine_id).cloned());
        assert_eq!(machine.unwrap().last_ping_at_ms, 0);
    }

    #[test]
    fn private_tool_only_callable_by_registering_machine() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let registry = Registry::new(store);
        let cluster_id = ClusterId::new("cls");
        let machine_a = MachineId::new("mch_a");
        let machine_b = MachineId::new("mch_b");

        registry
            .heartbeat(
                cluster_id.clone(),
                machine_a.clone(),
                MachineHeartbeat::default(),
                &[tool_decl("secret", true)],
                0,
            )
            .unwrap();

        let for_a = registry.callable_tools(&cluster_id, Some(&machine_a), 0);
        assert_eq!(for_a.len(), 1);
        let for_b = registry.callable_tools(&cluster_id, Some(&machine_b), 0);
        assert!(for_b.is_empty());
    }

    #[test]
    fn declared_tool_never_expires() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let registry = Registry::new(store);
        let cluster_id = ClusterId::new("cls");

        registry
            .declare_tool(
                cluster_id.clone(),
                ToolName::new("workflowsFoo1"),
                None,
                None,
                ToolConfig { private: true, ..Default::default() },
                0,
            )
            .unwrap();

        assert!(registry.is_tool_callable(&cluster_id, &ToolName::new("workflowsFoo1"), 10_000_000));
    }
}
